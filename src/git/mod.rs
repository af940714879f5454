pub mod github;
pub mod types;
pub mod url_parser;

use async_trait::async_trait;
use types::*;

use crate::error::HarperBotError;
use crate::processing::anchor::ReviewComment;

/// Trait for the code-hosting platform, scoped to one pull request.
#[async_trait]
pub trait GitProvider: Send + Sync {
    /// Fetch title, author, branches, changed files and the raw diff.
    async fn get_pr_details(&self) -> Result<PrDetails, HarperBotError>;

    /// Post a top-level comment on the PR.
    async fn publish_comment(&self, body: &str) -> Result<Option<CommentId>, HarperBotError>;

    /// Submit inline comments as one review anchored to `commit_id`.
    async fn create_review(
        &self,
        commit_id: &str,
        comments: &[ReviewComment],
    ) -> Result<(), HarperBotError>;

    /// File contents at a git ref (branch name or sha).
    async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<String, HarperBotError>;

    /// Create `name` from the tip of `from_branch`.
    ///
    /// Returns `false` when the branch already exists.
    async fn create_branch(&self, name: &str, from_branch: &str) -> Result<bool, HarperBotError>;

    /// Commit `files` on top of `branch` and move the branch. Returns the new commit sha.
    async fn commit_changes(
        &self,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> Result<String, HarperBotError>;

    /// Open a pull request from `head` into `base`.
    async fn create_pull(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<CreatedPull, HarperBotError>;
}
