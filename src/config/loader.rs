use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, RwLock};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use regex::Regex;

use crate::config::types::Settings;
use crate::error::HarperBotError;

// Embedded defaults keep the binary self-contained.
static CONFIGURATION_TOML: &str = include_str!("../../settings/configuration.toml");
static PROMPTS_TOML: &str = include_str!("../../settings/prompts.toml");

/// Bot config files in the YAML format used by existing deployments,
/// lowest precedence first.
const BOT_CONFIG_PATHS: &[&str] = &["harperbot/config.yaml", "config.yaml"];

/// Plain env var names mapped onto settings keys.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("GEMINI_API_KEY", "gemini.key"),
    ("GITHUB_TOKEN", "github.user_token"),
    ("WEBHOOK_SECRET", "github.webhook_secret"),
    ("HARPER_BOT_APP_ID", "github.app_id"),
    ("HARPER_BOT_PRIVATE_KEY", "github.private_key"),
    ("PORT", "server.port"),
];

/// Prompt placeholders written as `{name}` in YAML bot configs.
static PROMPT_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{?\s*(num_files|files_list|diff_content|focus_instruction)\s*\}\}?").unwrap()
});

static GLOBAL_SETTINGS: RwLock<Option<Arc<Settings>>> = RwLock::new(None);

tokio::task_local! {
    /// Per-delivery settings override (webhook mode).
    static REQUEST_SETTINGS: Arc<Settings>;
}

/// Get the current settings.
///
/// Returns the per-request override if one is in scope, otherwise the
/// global singleton.
pub fn get_settings() -> Arc<Settings> {
    REQUEST_SETTINGS.try_with(Arc::clone).unwrap_or_else(|_| {
        let guard = GLOBAL_SETTINGS.read().unwrap_or_else(|poisoned| {
            tracing::error!("settings RwLock poisoned, recovering inner value");
            poisoned.into_inner()
        });
        if let Some(settings) = guard.as_ref() {
            return settings.clone();
        }
        drop(guard);

        tracing::error!("get_settings() called before init_settings(), loading defaults");
        let fallback = Arc::new(load_settings(&HashMap::new(), None).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load fallback settings, using Default");
            Settings::default()
        }));
        *GLOBAL_SETTINGS
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(fallback.clone());
        fallback
    })
}

/// Initialize (or re-initialize) global settings.
pub fn init_settings(
    cli_overrides: &HashMap<String, String>,
) -> Result<Arc<Settings>, HarperBotError> {
    let settings = Arc::new(load_settings(cli_overrides, None)?);
    *GLOBAL_SETTINGS.write().unwrap_or_else(|poisoned| {
        tracing::error!("settings RwLock poisoned, recovering inner value");
        poisoned.into_inner()
    }) = Some(settings.clone());
    Ok(settings)
}

/// Run an async block with per-request settings override.
pub async fn with_settings<F, T>(settings: Arc<Settings>, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    REQUEST_SETTINGS.scope(settings, f).await
}

/// Build the configuration by merging layers, lowest precedence first:
///
/// 1. Embedded TOML defaults (`settings/configuration.toml`, `settings/prompts.toml`)
/// 2. YAML bot config: `bot_config_yaml` if given, otherwise `config.yaml` files on disk
/// 3. Secrets file (`.secrets.toml`, optional)
/// 4. CLI argument overrides (`--section.key=value`)
/// 5. Environment variables
pub fn load_settings(
    cli_overrides: &HashMap<String, String>,
    bot_config_yaml: Option<&str>,
) -> Result<Settings, HarperBotError> {
    let mut figment = embedded_defaults();

    let yaml_sources: Vec<(String, String)> = match bot_config_yaml {
        Some(yaml) => vec![("<inline>".into(), yaml.to_string())],
        None => BOT_CONFIG_PATHS
            .iter()
            .filter(|path| Path::new(path).is_file())
            .filter_map(|path| match std::fs::read_to_string(path) {
                Ok(text) => Some((path.to_string(), text)),
                Err(e) => {
                    tracing::error!(path, error = %e, "failed to read bot config");
                    None
                }
            })
            .collect(),
    };
    for (source, yaml) in &yaml_sources {
        match bot_config_to_toml(yaml) {
            Ok(Some(fragment)) => {
                tracing::debug!(source = %source, "merging bot config");
                figment = figment.merge(Toml::string(&fragment));
            }
            Ok(None) => {}
            Err(e) => tracing::error!(source = %source, error = %e, "error loading bot config, skipping"),
        }
    }

    figment = figment.merge(Toml::file(".secrets.toml"));
    figment = figment.merge(Toml::file("settings/.secrets.toml"));

    for (key, value) in cli_overrides {
        if let Some(fragment) = override_to_toml(key, value) {
            figment = figment.merge(Toml::string(&fragment));
        }
    }

    let alias_names: Vec<&str> = ENV_ALIASES.iter().map(|(name, _)| *name).collect();
    figment = figment.merge(Env::raw().only(&alias_names).map(|key| {
        ENV_ALIASES
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map_or_else(|| key.into(), |(_, target)| (*target).into())
    }));

    // SECTION.KEY env vars (CONFIG.MODEL -> config.model), merged as TOML
    // fragments so values get the same type detection as CLI overrides
    for (key, value) in std::env::vars() {
        if !key.contains('.') {
            continue;
        }
        if let Some(fragment) = override_to_toml(&key.to_lowercase(), value.trim()) {
            figment = figment.merge(Toml::string(&fragment));
        }
    }

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

fn embedded_defaults() -> Figment {
    Figment::new()
        .merge(Toml::string(CONFIGURATION_TOML))
        .merge(Toml::string(PROMPTS_TOML))
}

/// Settings from the embedded defaults alone, ignoring files and environment.
pub fn default_settings() -> Result<Settings, HarperBotError> {
    Ok(embedded_defaults().extract()?)
}

/// Translate a flat YAML bot config into a TOML fragment.
///
/// Top-level keys land in `[config]`, except `prompt` which becomes
/// `[prompt].template`. Prompt placeholders in `{name}` form are rewritten to
/// `{{ name }}`. Null values are dropped. Returns `None` for an empty
/// document.
pub fn bot_config_to_toml(yaml: &str) -> Result<Option<String>, HarperBotError> {
    let parsed: Option<HashMap<String, serde_yaml_ng::Value>> = serde_yaml_ng::from_str(yaml)?;
    let Some(entries) = parsed else {
        return Ok(None);
    };

    let mut config = toml::Table::new();
    let mut prompt = toml::Table::new();
    for (key, value) in entries {
        if value.is_null() {
            continue;
        }
        let value = toml::Value::try_from(value)?;
        if key == "prompt" {
            let value = match value {
                toml::Value::String(text) => toml::Value::String(prompt_template(&text)),
                other => other,
            };
            prompt.insert("template".into(), value);
        } else {
            config.insert(key, value);
        }
    }

    let mut root = toml::Table::new();
    if !config.is_empty() {
        root.insert("config".into(), toml::Value::Table(config));
    }
    if !prompt.is_empty() {
        root.insert("prompt".into(), toml::Value::Table(prompt));
    }
    if root.is_empty() {
        return Ok(None);
    }
    Ok(Some(toml::to_string(&root)?))
}

/// Rewrite `{num_files}`-style placeholders as template expressions.
/// Placeholders already in `{{ name }}` form come out unchanged.
fn prompt_template(text: &str) -> String {
    PROMPT_PLACEHOLDER_RE
        .replace_all(text, "{{ $1 }}")
        .into_owned()
}

/// Convert `section.key` / value into a `[section]\nkey = value` TOML fragment.
fn override_to_toml(key: &str, value: &str) -> Option<String> {
    let Some((section, field)) = key.split_once('.') else {
        tracing::warn!("ignoring override with no section: {key}={value}");
        return None;
    };
    Some(format!("[{section}]\n{field} = {}", toml_scalar(value)))
}

/// Encode a raw string as a TOML scalar: bools and numbers stay literal,
/// everything else is quoted and escaped.
fn toml_scalar(value: &str) -> String {
    let is_literal = value == "true"
        || value == "false"
        || value.parse::<i64>().is_ok()
        || value.parse::<f64>().is_ok();
    if is_literal {
        return value.to_string();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("\"{escaped}\"")
}
