use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarperBotError {
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    #[error("Git provider error: {0}")]
    GitProvider(String),

    #[error("AI handler error: {0}")]
    Ai(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template rendering error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl From<figment::Error> for HarperBotError {
    fn from(err: figment::Error) -> Self {
        HarperBotError::Config(Box::new(err))
    }
}
