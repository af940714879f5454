use std::fmt;

use serde::{Deserialize, Serialize};

/// Redact a secret string for Debug output. Shows "[REDACTED]" if non-empty, "[]" if empty.
fn redact(s: &str) -> &str {
    if s.is_empty() { "[]" } else { "[REDACTED]" }
}

// ── Top-level Settings ──────────────────────────────────────────────

/// Top-level configuration. Each field maps to a TOML `[section]`.
/// Uses `#[serde(default)]` so missing sections gracefully fall back.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Settings {
    pub config: GlobalConfig,
    pub gemini: GeminiSecrets,
    pub github: GithubConfig,
    pub server: ServerConfig,
    pub prompt: PromptTemplate,
}

// ── [config] ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub model: String,
    /// Model used when a PR crosses either complexity threshold.
    pub complex_model: String,
    /// One of `all`, `security`, `performance`, `quality`.
    pub focus: String,
    /// Diff characters sent to the model.
    pub max_diff_length: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Model output characters kept after sanitising.
    pub max_response_chars: usize,
    pub complex_diff_threshold: usize,
    pub complex_files_threshold: usize,
    pub publish_output: bool,
    pub enable_authoring: bool,
    pub auto_commit_suggestions: bool,
    pub create_improvement_prs: bool,
    pub improvement_branch_pattern: String,
    /// HTTP timeout in seconds for model and GitHub calls.
    pub http_timeout: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            complex_model: "gemini-2.5-flash".into(),
            focus: "all".into(),
            max_diff_length: 4000,
            temperature: 0.2,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 4096,
            max_response_chars: 10_000,
            complex_diff_threshold: 10_000,
            complex_files_threshold: 10,
            publish_output: true,
            enable_authoring: false,
            auto_commit_suggestions: false,
            create_improvement_prs: false,
            improvement_branch_pattern: "harperbot-improvements-{timestamp}".into(),
            http_timeout: 120,
        }
    }
}

impl GlobalConfig {
    pub fn focus(&self) -> Focus {
        Focus::from_name(&self.focus)
    }
}

/// Review focus area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    All,
    Security,
    Performance,
    Quality,
}

impl Focus {
    /// Parse a focus name case-insensitively. Unknown names mean `All`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "security" => Focus::Security,
            "performance" => Focus::Performance,
            "quality" => Focus::Quality,
            "all" => Focus::All,
            other => {
                tracing::warn!(focus = other, "unknown review focus, using 'all'");
                Focus::All
            }
        }
    }

    /// Instruction inserted into the prompt. Empty for `All`.
    pub fn instruction(self) -> &'static str {
        match self {
            Focus::All => "",
            Focus::Security => {
                "Focus primarily on security concerns, authentication, data handling, and potential vulnerabilities."
            }
            Focus::Performance => {
                "Focus primarily on performance optimizations, efficiency, and potential bottlenecks."
            }
            Focus::Quality => {
                "Focus primarily on code quality, maintainability, readability, and best practices."
            }
        }
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Focus::All => "all",
            Focus::Security => "security",
            Focus::Performance => "performance",
            Focus::Quality => "quality",
        })
    }
}

// ── [gemini] ────────────────────────────────────────────────────────

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiSecrets {
    /// API key (set via GEMINI_API_KEY env var).
    pub key: String,
    pub api_base: String,
}

impl Default for GeminiSecrets {
    fn default() -> Self {
        Self {
            key: String::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

impl fmt::Debug for GeminiSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSecrets")
            .field("key", &redact(&self.key))
            .field("api_base", &self.api_base)
            .finish()
    }
}

// ── [github] ────────────────────────────────────────────────────────

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubConfig {
    /// `user` (personal token) or `app` (GitHub App installation token).
    pub deployment_type: String,
    pub base_url: String,
    /// User token for authentication (set via GITHUB_TOKEN env var).
    pub user_token: String,
    /// GitHub App ID (set via HARPER_BOT_APP_ID).
    pub app_id: u64,
    /// GitHub App RSA private key PEM (set via HARPER_BOT_PRIVATE_KEY).
    pub private_key: String,
    /// Webhook secret (set via WEBHOOK_SECRET).
    pub webhook_secret: String,
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("deployment_type", &self.deployment_type)
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("user_token", &redact(&self.user_token))
            .field("private_key", &redact(&self.private_key))
            .field("webhook_secret", &redact(&self.webhook_secret))
            .finish()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            deployment_type: "user".into(),
            base_url: "https://api.github.com".into(),
            user_token: String::new(),
            app_id: 0,
            private_key: String::new(),
            webhook_secret: String::new(),
        }
    }
}

// ── [server] ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            webhook_path: "/webhook".into(),
        }
    }
}

// ── [prompt] ────────────────────────────────────────────────────────

/// Review prompt, a minijinja template over `num_files`, `files_list`,
/// `diff_content` and `focus_instruction`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PromptTemplate {
    pub template: String,
}
