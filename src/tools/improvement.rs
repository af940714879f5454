//! Follow-up pull request carrying the bot's improvement notes.

use crate::error::HarperBotError;
use crate::git::GitProvider;
use crate::git::types::{CreatedPull, PrDetails};
use crate::util::truncate_chars;

const INITIAL_COMMIT_MESSAGE: &str = "Initial commit for HarperBot improvements";
const SUMMARY_CHARS: usize = 1000;

/// Expand `{timestamp}` and `{pr_number}` in a branch name pattern.
pub fn branch_name(pattern: &str, pr_number: u64, timestamp: i64) -> String {
    pattern
        .replace("{timestamp}", &timestamp.to_string())
        .replace("{pr_number}", &pr_number.to_string())
}

pub fn improvement_title(pr_number: u64) -> String {
    format!("HarperBot Improvements for PR #{pr_number}")
}

pub fn improvement_body(pr_number: u64, analysis: &str) -> String {
    format!(
        "## HarperBot Improvement Suggestions\n\n\
         This PR contains additional improvements suggested by HarperBot analysis of PR #{pr_number}.\n\n\
         ### Analysis Summary\n\
         {}...\n\n\
         ---\n\
         *Generated by HarperBot*",
        truncate_chars(analysis, SUMMARY_CHARS)
    )
}

/// Open an improvement PR against the base branch of `details`.
///
/// The branch is cut from the base branch (an existing branch of the same
/// name is reused) and receives an empty commit so the PR has a diff head.
pub async fn create_improvement_pr(
    provider: &dyn GitProvider,
    details: &PrDetails,
    analysis: &str,
    branch_pattern: &str,
) -> Result<CreatedPull, HarperBotError> {
    let branch = branch_name(
        branch_pattern,
        details.number,
        chrono::Utc::now().timestamp(),
    );
    let base = if details.base_branch.is_empty() {
        "main"
    } else {
        &details.base_branch
    };

    if !provider.create_branch(&branch, base).await? {
        tracing::info!(branch = %branch, "improvement branch already exists, reusing");
    }
    provider
        .commit_changes(&branch, INITIAL_COMMIT_MESSAGE, &[])
        .await?;

    let pull = provider
        .create_pull(
            &improvement_title(details.number),
            &improvement_body(details.number, analysis),
            &branch,
            base,
        )
        .await?;
    tracing::info!(number = pull.number, url = %pull.url, "opened improvement PR");
    Ok(pull)
}
