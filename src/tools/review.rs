use std::sync::Arc;

use crate::ai::AiHandler;
use crate::ai::analysis::analyze_pr;
use crate::config::loader::get_settings;
use crate::config::types::Settings;
use crate::error::HarperBotError;
use crate::git::GitProvider;
use crate::git::types::PrDetails;
use crate::output::comment::{format_comment, update_main_comment};
use crate::processing::anchor::{ReviewComment, anchor_suggestions};
use crate::processing::suggestions::extract;

use super::apply::apply_to_pr;
use super::improvement::create_improvement_pr;

/// What a review run produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Suggestions found in the analysis.
    pub suggestions: usize,
    /// Suggestions that were anchored to a diff position.
    pub inline_comments: usize,
}

/// PR Reviewer tool.
///
/// Fetches the PR, asks the model for an analysis, publishes it as a comment
/// and posts its code suggestions as one inline review.
pub struct PRReviewer {
    provider: Arc<dyn GitProvider>,
    ai: Option<Arc<dyn AiHandler>>,
}

impl PRReviewer {
    pub fn new(provider: Arc<dyn GitProvider>) -> Self {
        Self { provider, ai: None }
    }

    #[cfg(test)]
    pub fn new_with_ai(provider: Arc<dyn GitProvider>, ai: Arc<dyn AiHandler>) -> Self {
        Self {
            provider,
            ai: Some(ai),
        }
    }

    /// Run the full review pipeline.
    pub async fn run(&self) -> Result<ReviewOutcome, HarperBotError> {
        let settings = get_settings();
        let ai = super::resolve_ai_handler(&self.ai)?;

        let details = self.provider.get_pr_details().await?;
        tracing::info!(
            pr = details.number,
            files = details.files_changed.len(),
            diff_bytes = details.diff.len(),
            "analysing pull request"
        );

        let analysis = analyze_pr(ai.as_ref(), &details, &settings).await?;

        if settings.config.publish_output {
            post_review(self.provider.as_ref(), &details, &analysis, &settings).await
        } else {
            Ok(print_review(&details, &analysis))
        }
    }
}

/// Publish an analysis to the PR.
///
/// The main comment always goes out first. Inline review and authoring
/// failures are logged and do not fail the run.
pub async fn post_review(
    provider: &dyn GitProvider,
    details: &PrDetails,
    analysis: &str,
    settings: &Settings,
) -> Result<ReviewOutcome, HarperBotError> {
    let suggestions = extract(analysis);

    provider
        .publish_comment(&format_comment(&update_main_comment(analysis)))
        .await?;
    tracing::info!(pr = details.number, "posted analysis comment");

    let comments = anchor_suggestions(&details.diff, &suggestions);
    publish_inline(provider, details, &comments).await;

    let config = &settings.config;
    if config.enable_authoring {
        if config.auto_commit_suggestions
            && !suggestions.is_empty()
            && let Err(e) = apply_to_pr(provider, details, &suggestions).await
        {
            tracing::error!(pr = details.number, error = %e, "failed to apply suggestions");
        }
        if config.create_improvement_prs
            && let Err(e) = create_improvement_pr(
                provider,
                details,
                analysis,
                &config.improvement_branch_pattern,
            )
            .await
        {
            tracing::error!(pr = details.number, error = %e, "failed to create improvement PR");
        }
    }

    Ok(ReviewOutcome {
        suggestions: suggestions.len(),
        inline_comments: comments.len(),
    })
}

async fn publish_inline(provider: &dyn GitProvider, details: &PrDetails, comments: &[ReviewComment]) {
    if comments.is_empty() {
        return;
    }
    match provider.create_review(&details.head_sha, comments).await {
        Ok(()) => tracing::info!(
            pr = details.number,
            count = comments.len(),
            "posted inline suggestions"
        ),
        Err(e) => tracing::error!(error = %e, "failed to post review with suggestions"),
    }
}

/// Print the analysis and anchored suggestions to stdout (CLI mode).
fn print_review(details: &PrDetails, analysis: &str) -> ReviewOutcome {
    let suggestions = extract(analysis);
    let comments = anchor_suggestions(&details.diff, &suggestions);

    println!("{}", format_comment(&update_main_comment(analysis)));
    for comment in &comments {
        println!(
            "\n{} (position {}):\n{}",
            comment.path, comment.position, comment.body
        );
    }

    ReviewOutcome {
        suggestions: suggestions.len(),
        inline_comments: comments.len(),
    }
}
