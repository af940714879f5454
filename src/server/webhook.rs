use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::config::loader::get_settings;
use crate::error::HarperBotError;
use crate::git::GitProvider;
use crate::git::github::GithubProvider;
use crate::git::url_parser::{ParsedPrUrl, parse_repo_name};
use crate::tools::apply::PRApplier;
use crate::tools::review::PRReviewer;

type HmacSha256 = Hmac<Sha256>;

const REVIEW_ACTIONS: [&str; 3] = ["opened", "synchronize", "reopened"];

/// Pull request a webhook delivery refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrTarget {
    pub repo_full_name: String,
    pub pr_number: u64,
    pub installation_id: Option<u64>,
}

/// What to do with a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    Review(PrTarget),
    /// `/apply` comment on a PR.
    Apply(PrTarget),
    Ignore,
}

/// Main webhook handler: POST `{server.webhook_path}`
///
/// Steps:
/// 1. Verify HMAC-SHA256 signature
/// 2. Parse event type and action
/// 3. Dispatch accepted events to a background task
/// 4. Return 200 immediately
pub async fn handle_github_webhook(headers: HeaderMap, body: Bytes) -> Response {
    // 1. Verify signature
    let settings = get_settings();
    let secret = &settings.github.webhook_secret;

    if secret.is_empty() {
        tracing::error!("webhook_secret is not configured, rejecting request");
        return invalid_signature();
    }

    let signature = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if let Err(e) = verify_signature(&body, secret, signature) {
        tracing::warn!(error = %e, "webhook signature verification failed");
        return invalid_signature();
    }

    // 2. Parse body and event type
    let event = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse webhook payload");
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid JSON"})))
                .into_response();
        }
    };

    let action = classify_event(event, &payload);
    tracing::info!(event, action = ?action, "received webhook");

    if action == WebhookAction::Ignore {
        return Json(json!({"status": "ignored"})).into_response();
    }

    // 3. Dispatch in background task
    tokio::spawn(async move {
        if let Err(e) = dispatch(action).await {
            tracing::error!(error = %e, "webhook handler failed");
        }
    });

    // 4. Return 200 immediately
    Json(json!({"status": "accepted"})).into_response()
}

fn invalid_signature() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"error": "Invalid signature"})),
    )
        .into_response()
}

/// Verify the HMAC-SHA256 signature from GitHub.
///
/// Compares the provided `sha256=...` header against the HMAC of the request body.
fn verify_signature(body: &[u8], secret: &str, signature_header: &str) -> Result<(), String> {
    let signature_hex = signature_header
        .strip_prefix("sha256=")
        .ok_or_else(|| "missing sha256= prefix".to_string())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("invalid HMAC key: {e}"))?;
    mac.update(body);

    let expected =
        hex::decode(signature_hex).map_err(|e| format!("invalid hex in signature: {e}"))?;

    mac.verify_slice(&expected)
        .map_err(|_| "HMAC verification failed".to_string())
}

/// Decide how to handle a delivery from its event name and payload.
pub fn classify_event(event: &str, payload: &serde_json::Value) -> WebhookAction {
    let action = payload["action"].as_str().unwrap_or("");
    match event {
        "pull_request" if REVIEW_ACTIONS.contains(&action) => {
            pr_target(payload, &payload["pull_request"]["number"])
                .map_or(WebhookAction::Ignore, WebhookAction::Review)
        }
        "issue_comment" if action == "created" => {
            // Plain issues have no `pull_request` key.
            if payload["issue"]["pull_request"].is_null() {
                return WebhookAction::Ignore;
            }
            let body = payload["comment"]["body"].as_str().unwrap_or("");
            if !body.trim().eq_ignore_ascii_case("/apply") {
                return WebhookAction::Ignore;
            }
            pr_target(payload, &payload["issue"]["number"])
                .map_or(WebhookAction::Ignore, WebhookAction::Apply)
        }
        _ => WebhookAction::Ignore,
    }
}

fn pr_target(payload: &serde_json::Value, number: &serde_json::Value) -> Option<PrTarget> {
    Some(PrTarget {
        repo_full_name: payload["repository"]["full_name"].as_str()?.to_string(),
        pr_number: number.as_u64()?,
        installation_id: payload["installation"]["id"].as_u64(),
    })
}

async fn dispatch(action: WebhookAction) -> Result<(), HarperBotError> {
    let (target, apply) = match action {
        WebhookAction::Review(target) => (target, false),
        WebhookAction::Apply(target) => (target, true),
        WebhookAction::Ignore => return Ok(()),
    };

    let (owner, repo) = parse_repo_name(&target.repo_full_name)?;
    let parsed = ParsedPrUrl {
        owner,
        repo,
        pr_number: target.pr_number,
    };
    let provider: Arc<dyn GitProvider> =
        Arc::new(GithubProvider::for_pr(parsed, target.installation_id).await?);

    if apply {
        tracing::info!(repo = %target.repo_full_name, pr = target.pr_number, "handling /apply");
        PRApplier::new(provider).run().await
    } else {
        tracing::info!(repo = %target.repo_full_name, pr = target.pr_number, "reviewing PR");
        let outcome = PRReviewer::new(provider).run().await?;
        tracing::info!(
            pr = target.pr_number,
            suggestions = outcome.suggestions,
            inline = outcome.inline_comments,
            "review complete"
        );
        Ok(())
    }
}
