use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HarperBotError;
use crate::git::GitProvider;
use crate::git::types::*;
use crate::processing::anchor::ReviewComment;
use crate::testing::fixtures::sample_pr_details;

/// Captured calls made to the mock provider, for test assertions.
#[derive(Debug, Default)]
pub struct MockCalls {
    pub comments: Vec<String>,
    /// (commit_id, comments) per submitted review.
    pub reviews: Vec<(String, Vec<ReviewComment>)>,
    /// (name, from_branch)
    pub branches: Vec<(String, String)>,
    /// (branch, message, files)
    pub commits: Vec<(String, String, Vec<FileChange>)>,
    /// (title, body, head, base)
    pub pulls: Vec<(String, String, String, String)>,
}

/// Mock git provider for pipeline tests.
///
/// Pre-configured with PR details and file contents. Captures all publish
/// and authoring calls for assertions.
pub struct MockGitProvider {
    pub details: PrDetails,
    /// Contents by path; paths not listed fail to fetch.
    pub files: HashMap<String, String>,
    pub existing_branches: Vec<String>,
    pub fail_reviews: bool,
    pub calls: Mutex<MockCalls>,
}

impl MockGitProvider {
    pub fn new() -> Self {
        Self {
            details: sample_pr_details(),
            files: HashMap::new(),
            existing_branches: Vec::new(),
            fail_reviews: false,
            calls: Mutex::new(MockCalls::default()),
        }
    }

    pub fn with_details(mut self, details: PrDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn with_existing_branch(mut self, name: &str) -> Self {
        self.existing_branches.push(name.into());
        self
    }

    pub fn with_failing_reviews(mut self) -> Self {
        self.fail_reviews = true;
        self
    }

    pub fn get_calls(&self) -> std::sync::MutexGuard<'_, MockCalls> {
        self.calls.lock().unwrap()
    }
}

#[async_trait]
impl GitProvider for MockGitProvider {
    async fn get_pr_details(&self) -> Result<PrDetails, HarperBotError> {
        Ok(self.details.clone())
    }

    async fn publish_comment(&self, body: &str) -> Result<Option<CommentId>, HarperBotError> {
        let mut calls = self.calls.lock().unwrap();
        calls.comments.push(body.into());
        Ok(Some(CommentId(calls.comments.len() as u64)))
    }

    async fn create_review(
        &self,
        commit_id: &str,
        comments: &[ReviewComment],
    ) -> Result<(), HarperBotError> {
        if self.fail_reviews {
            return Err(HarperBotError::GitProvider(
                "GitHub API POST 422 Unprocessable Entity: position is invalid".into(),
            ));
        }
        self.calls
            .lock()
            .unwrap()
            .reviews
            .push((commit_id.into(), comments.to_vec()));
        Ok(())
    }

    async fn get_file_content(&self, path: &str, _git_ref: &str) -> Result<String, HarperBotError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| HarperBotError::GitProvider(format!("GitHub API GET 404: {path}")))
    }

    async fn create_branch(&self, name: &str, from_branch: &str) -> Result<bool, HarperBotError> {
        self.calls
            .lock()
            .unwrap()
            .branches
            .push((name.into(), from_branch.into()));
        Ok(!self.existing_branches.iter().any(|b| b == name))
    }

    async fn commit_changes(
        &self,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> Result<String, HarperBotError> {
        let mut calls = self.calls.lock().unwrap();
        calls
            .commits
            .push((branch.into(), message.into(), files.to_vec()));
        Ok(format!("mock-commit-{}", calls.commits.len()))
    }

    async fn create_pull(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<CreatedPull, HarperBotError> {
        let mut calls = self.calls.lock().unwrap();
        calls
            .pulls
            .push((title.into(), body.into(), head.into(), base.into()));
        let number = 100 + calls.pulls.len() as u64;
        Ok(CreatedPull {
            number,
            url: format!("https://github.com/octo/harper/pull/{number}"),
        })
    }
}
