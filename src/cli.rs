use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::loader::init_settings;
use crate::config::types::Settings;
use crate::error::HarperBotError;
use crate::git::GitProvider;
use crate::git::github::GithubProvider;
use crate::git::url_parser::{ParsedPrUrl, parse_pr_url, parse_repo_name};
use crate::processing::anchor::anchor_suggestions;
use crate::processing::suggestions::extract;
use crate::tools::review::PRReviewer;

/// HarperBot: Gemini-powered pull request review with inline suggestions.
#[derive(Parser, Debug)]
#[command(name = "harperbot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Extra arguments passed as config overrides (--section.key=value).
    /// Place after `--` separator: `harperbot review --pr-url=<url> -- --config.focus=security`
    #[arg(last = true, allow_hyphen_values = true, global = true)]
    pub rest: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Analyse a pull request and publish the review.
    Review {
        /// Repository as owner/repo (with --pr).
        #[arg(long, requires = "pr", conflicts_with = "pr_url")]
        repo: Option<String>,
        /// Pull request number (with --repo).
        #[arg(long, requires = "repo")]
        pr: Option<u64>,
        /// Full pull request URL.
        #[arg(long)]
        pr_url: Option<String>,
    },
    /// Anchor the suggestions in a saved analysis to a saved diff and print
    /// the review comments as JSON. Works offline.
    Anchor {
        /// Unified diff of the pull request.
        #[arg(long)]
        diff: PathBuf,
        /// Model output containing fenced diff suggestions.
        #[arg(long)]
        analysis: PathBuf,
    },
    /// Start the webhook server.
    Serve,
    /// Show the effective configuration.
    #[command(alias = "settings")]
    Config,
}

impl Command {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Command::Review { .. } => "review",
            Command::Anchor { .. } => "anchor",
            Command::Serve => "serve",
            Command::Config => "config",
        }
    }
}

/// Config keys that cannot be overridden from the command line.
pub const FORBIDDEN_OVERRIDE_KEYS: &[&str] = &[
    "key",
    "api_base",
    "base_url",
    "deployment_type",
    "user_token",
    "app_id",
    "private_key",
    "webhook_secret",
];

/// Check if a config key is forbidden for override.
///
/// Returns `Some(matched_forbidden_key)` if the key matches, `None` if allowed.
pub fn check_forbidden_key(key: &str) -> Option<&'static str> {
    let key_lower = key.to_lowercase();
    let segments: Vec<&str> = key_lower.split('.').collect();
    FORBIDDEN_OVERRIDE_KEYS
        .iter()
        .find(|&&forbidden| key_lower == forbidden || segments.contains(&forbidden))
        .copied()
}

/// Parse the `rest` args into a HashMap of config overrides.
/// Format: `--section.key=value` or `--section__key=value` (double underscores → dots).
fn parse_config_overrides(rest: &[String]) -> Result<HashMap<String, String>, HarperBotError> {
    let mut overrides = HashMap::new();

    for arg in rest {
        let stripped = arg.trim_start_matches('-');
        if stripped.is_empty() {
            continue;
        }
        let stripped = stripped.replace("__", ".");

        if let Some((key, value)) = stripped.split_once('=') {
            if let Some(forbidden) = check_forbidden_key(key) {
                return Err(HarperBotError::Other(format!(
                    "forbidden CLI override: '{key}' (matches '{forbidden}')"
                )));
            }
            overrides.insert(key.to_string(), value.to_string());
        }
    }

    Ok(overrides)
}

/// Work out which PR `review` targets.
fn review_target(
    repo: Option<&str>,
    pr: Option<u64>,
    pr_url: Option<&str>,
) -> Result<ParsedPrUrl, HarperBotError> {
    match (repo, pr, pr_url) {
        (_, _, Some(url)) => parse_pr_url(url),
        (Some(repo), Some(pr_number), None) => {
            let (owner, repo) = parse_repo_name(repo)?;
            Ok(ParsedPrUrl {
                owner,
                repo,
                pr_number,
            })
        }
        _ => Err(HarperBotError::Other(
            "review needs either --repo and --pr, or --pr-url".into(),
        )),
    }
}

pub async fn run() -> Result<(), HarperBotError> {
    let cli = Cli::parse();

    let config_overrides = parse_config_overrides(&cli.rest)?;
    let settings = init_settings(&config_overrides)?;

    tracing::info!(
        command = cli.command.canonical_name(),
        overrides = config_overrides.len(),
        model = %settings.config.model,
        "starting harperbot"
    );

    match cli.command {
        Command::Review { repo, pr, pr_url } => {
            let target = review_target(repo.as_deref(), pr, pr_url.as_deref())?;
            let provider: Arc<dyn GitProvider> =
                Arc::new(GithubProvider::for_pr(target, None).await?);
            let outcome = PRReviewer::new(provider).run().await?;
            tracing::info!(
                suggestions = outcome.suggestions,
                inline = outcome.inline_comments,
                "review complete"
            );
        }
        Command::Anchor { diff, analysis } => {
            let diff = tokio::fs::read_to_string(&diff).await?;
            let analysis = tokio::fs::read_to_string(&analysis).await?;
            println!("{}", anchor_json(&diff, &analysis)?);
        }
        Command::Serve => {
            crate::server::start_server().await?;
        }
        Command::Config => {
            print!("{}", describe_settings(&settings)?);
        }
    }

    Ok(())
}

/// Review comments for `analysis` anchored to `diff`, as pretty JSON.
fn anchor_json(diff: &str, analysis: &str) -> Result<String, HarperBotError> {
    let comments = anchor_suggestions(diff, &extract(analysis));
    Ok(serde_json::to_string_pretty(&comments)?)
}

/// Non-secret settings as TOML.
fn describe_settings(settings: &Settings) -> Result<String, HarperBotError> {
    let mut out = String::from("[config]\n");
    out.push_str(&toml::to_string_pretty(&settings.config)?);
    out.push_str("\n[server]\n");
    out.push_str(&toml::to_string_pretty(&settings.server)?);
    out.push_str(&format!(
        "\n[github]\ndeployment_type = \"{}\"\nbase_url = \"{}\"\n",
        settings.github.deployment_type, settings.github.base_url
    ));
    Ok(out)
}
