use serde::Serialize;

/// Pull request metadata and raw diff, as sent to the model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrDetails {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
    /// Paths of changed files, in API order.
    pub files_changed: Vec<String>,
    /// Full unified diff of the PR.
    pub diff: String,
    pub base_branch: String,
    pub head_branch: String,
    /// Head commit; review comments are anchored to it.
    pub head_sha: String,
}

/// New content for one file in a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

/// Opaque comment identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentId(pub u64);

/// A pull request opened by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPull {
    pub number: u64,
    pub url: String,
}
