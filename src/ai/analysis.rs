//! Turn a pull request into a review analysis.

use std::collections::HashMap;
use std::sync::LazyLock;

use minijinja::Value;
use regex::Regex;

use super::types::{ChatResponse, FinishReason};
use super::{AiHandler, GenerationParams};
use crate::config::types::{GlobalConfig, Settings};
use crate::error::HarperBotError;
use crate::git::types::PrDetails;
use crate::template::render_prompt;
use crate::util::truncate_chars;

static SCRIPT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?script[^>]*>").unwrap());
static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static JS_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript:").unwrap());
static EVENT_HANDLER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").unwrap());

const TRUNCATION_NOTICE: &str = "... (truncated for length)";

/// Pick the model: large diffs or many files go to the complex model.
pub fn select_model<'a>(details: &PrDetails, config: &'a GlobalConfig) -> &'a str {
    let diff_chars = details.diff.chars().count();
    let num_files = details.files_changed.len();
    if diff_chars > config.complex_diff_threshold || num_files > config.complex_files_threshold {
        tracing::info!(
            diff_chars,
            num_files,
            model = %config.complex_model,
            "complex PR, switching model"
        );
        &config.complex_model
    } else {
        &config.model
    }
}

/// Render the review prompt for `details`.
pub fn build_prompt(details: &PrDetails, settings: &Settings) -> Result<String, HarperBotError> {
    let config = &settings.config;
    let mut vars = HashMap::new();
    vars.insert("num_files".into(), Value::from(details.files_changed.len()));
    vars.insert(
        "files_list".into(),
        Value::from(details.files_changed.join(", ")),
    );
    vars.insert(
        "diff_content".into(),
        Value::from(truncate_chars(&details.diff, config.max_diff_length)),
    );
    vars.insert(
        "focus_instruction".into(),
        Value::from(config.focus().instruction()),
    );
    render_prompt(&settings.prompt, vars)
}

/// Ask the model to review the PR.
///
/// API failures and empty responses become user-facing messages rather than
/// errors, so the bot always has something to post. Only a broken prompt
/// template is returned as an error.
pub async fn analyze_pr(
    ai: &dyn AiHandler,
    details: &PrDetails,
    settings: &Settings,
) -> Result<String, HarperBotError> {
    let model = select_model(details, &settings.config);
    let prompt = build_prompt(details, settings)?;
    let params = GenerationParams::from_config(&settings.config);

    match ai.generate(model, &prompt, params).await {
        Ok(resp) => {
            if let Some(usage) = resp.usage {
                tracing::info!(
                    model,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    "analysis generated"
                );
            }
            Ok(response_text(&resp, settings.config.max_response_chars))
        }
        Err(e) => Ok(describe_api_error(&e, details, model)),
    }
}

/// Sanitised response text, or a message explaining why there is none.
pub fn response_text(resp: &ChatResponse, max_chars: usize) -> String {
    let text = sanitize_text(resp.content.trim(), max_chars);
    if !text.is_empty() {
        return text;
    }
    tracing::warn!(finish_reason = ?resp.finish_reason, "no text in model response");
    empty_response_message(resp.finish_reason).to_string()
}

fn empty_response_message(reason: FinishReason) -> &'static str {
    match reason {
        FinishReason::MaxTokens => {
            "Analysis truncated due to token limit. The code changes are too extensive for a complete analysis. Please review manually or split into smaller PRs."
        }
        FinishReason::Safety => {
            "Analysis blocked due to content safety filters. Please ensure the PR content complies with usage policies."
        }
        FinishReason::Stop => {
            "Analysis completed but no content was generated. This may indicate an issue with the prompt or model."
        }
        FinishReason::Recitation | FinishReason::Unknown => {
            "Unable to generate analysis due to an unexpected response format. Please try again or review the code manually."
        }
    }
}

/// Strip markup that could execute when rendered, then cap the length.
///
/// Fenced code blocks are left untouched so suggested code keeps its
/// generics and comparison operators.
pub fn sanitize_text(text: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, segment) in text.split("```").enumerate() {
        if i > 0 {
            out.push_str("```");
        }
        if i % 2 == 1 {
            out.push_str(segment);
            continue;
        }
        let cleaned = SCRIPT_TAG_RE.replace_all(segment, "");
        let cleaned = HTML_TAG_RE.replace_all(&cleaned, "");
        let cleaned = JS_SCHEME_RE.replace_all(&cleaned, "");
        let cleaned = EVENT_HANDLER_RE.replace_all(&cleaned, "");
        out.push_str(&cleaned);
    }

    let truncated = truncate_chars(&out, max_chars);
    if truncated.len() < out.len() {
        format!("{truncated}{TRUNCATION_NOTICE}").trim().to_string()
    } else {
        out.trim().to_string()
    }
}

/// Map an API failure to a message for the PR comment.
pub fn describe_api_error(err: &HarperBotError, details: &PrDetails, model: &str) -> String {
    let raw = err.to_string();
    let lower = raw.to_lowercase();
    let title = if details.title.is_empty() {
        "Unknown"
    } else {
        &details.title
    };
    let context = format!(
        " (PR: {title}, Model: {model}, Diff length: {})",
        details.diff.chars().count()
    );

    if ["quota", "rate limit", "billing", "429"]
        .iter()
        .any(|k| lower.contains(k))
    {
        tracing::error!(error = %raw, "API quota/rate limit error{context}");
        format!(
            "Error generating analysis: API quota exceeded{context}. Please check your billing or try again later."
        )
    } else if ["api key", "authentication", "unauthorized", "401", "403"]
        .iter()
        .any(|k| lower.contains(k))
    {
        tracing::error!(error = %raw, "API authentication error{context}");
        format!(
            "Error generating analysis: Invalid API key or authentication failed{context}. Please check your GEMINI_API_KEY."
        )
    } else if lower.contains("model") || lower.contains("not found") {
        tracing::error!(error = %raw, "model error{context}");
        format!(
            "Error generating analysis: Requested model not available{context}. Please try again later."
        )
    } else {
        tracing::error!(error = %raw, "unexpected API error{context}");
        format!("Error generating analysis: API unavailable{context}. Please try again later.")
    }
}
