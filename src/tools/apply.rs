//! Commit model suggestions straight onto the PR branch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ai::AiHandler;
use crate::ai::analysis::analyze_pr;
use crate::config::loader::get_settings;
use crate::error::HarperBotError;
use crate::git::GitProvider;
use crate::git::types::{FileChange, PrDetails};
use crate::processing::suggestions::{RawSuggestion, extract};

pub const APPLY_COMMIT_MESSAGE: &str = "Apply code suggestions from HarperBot analysis";
const APPLIED_CONFIRMATION: &str = "Applied code suggestions from HarperBot analysis.";
const NOTHING_TO_APPLY: &str = "No code suggestions found to apply.";

/// Rewrite file contents with the given suggestions.
///
/// Each suggestion replaces exactly one line. Suggestions for a file are
/// applied in line order; the running offset accounts for replacements that
/// added lines. Files with no applicable suggestion are left out.
pub fn apply_suggestions(
    contents: &HashMap<String, String>,
    suggestions: &[RawSuggestion],
) -> Vec<FileChange> {
    let mut groups: Vec<(&str, Vec<&RawSuggestion>)> = Vec::new();
    for suggestion in suggestions {
        let path = suggestion.file_path.as_str();
        match groups.iter_mut().find(|(p, _)| *p == path) {
            Some((_, group)) => group.push(suggestion),
            None => groups.push((path, vec![suggestion])),
        }
    }

    let mut changes = Vec::new();
    for (path, mut group) in groups {
        let current = contents.get(path).map(String::as_str).unwrap_or("");
        let mut lines: Vec<&str> = current.split('\n').collect();
        group.sort_by_key(|s| s.line);

        let mut offset: i64 = 0;
        let mut applied = false;
        for suggestion in group {
            let adjusted = i64::from(suggestion.line) - 1 + offset;
            if adjusted < 0 || adjusted >= lines.len() as i64 {
                tracing::warn!(
                    file = path,
                    line = suggestion.line,
                    adjusted,
                    "suggestion out of bounds, skipping"
                );
                continue;
            }
            let idx = adjusted as usize;
            let replacement: Vec<&str> = suggestion.replacement.split('\n').collect();
            offset += replacement.len() as i64 - 1;
            lines.splice(idx..=idx, replacement);
            applied = true;
        }

        if applied {
            changes.push(FileChange {
                path: path.to_string(),
                content: lines.join("\n"),
            });
        }
    }
    changes
}

/// Apply `suggestions` to the PR head branch as a single commit.
///
/// Returns the new commit sha, or `None` when nothing applied.
pub async fn apply_to_pr(
    provider: &dyn GitProvider,
    details: &PrDetails,
    suggestions: &[RawSuggestion],
) -> Result<Option<String>, HarperBotError> {
    let mut contents = HashMap::new();
    for suggestion in suggestions {
        let path = &suggestion.file_path;
        if contents.contains_key(path) {
            continue;
        }
        let content = match provider.get_file_content(path, &details.head_sha).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(file = %path, error = %e, "could not fetch file, treating as empty");
                String::new()
            }
        };
        contents.insert(path.clone(), content);
    }

    let changes = apply_suggestions(&contents, suggestions);
    if changes.is_empty() {
        tracing::info!(pr = details.number, "no suggestions could be applied");
        return Ok(None);
    }

    let sha = provider
        .commit_changes(&details.head_branch, APPLY_COMMIT_MESSAGE, &changes)
        .await?;
    tracing::info!(
        pr = details.number,
        files = changes.len(),
        commit = %sha,
        "applied suggestions"
    );
    Ok(Some(sha))
}

/// `/apply` command: re-analyse the PR, commit its suggestions and confirm.
pub struct PRApplier {
    provider: Arc<dyn GitProvider>,
    ai: Option<Arc<dyn AiHandler>>,
}

impl PRApplier {
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

    pub async fn run(&self) -> Result<(), HarperBotError> {
        let settings = get_settings();
        let ai = super::resolve_ai_handler(&self.ai)?;

        let details = self.provider.get_pr_details().await?;
        let analysis = analyze_pr(ai.as_ref(), &details, &settings).await?;
        let suggestions = extract(&analysis);

        if suggestions.is_empty() {
            self.provider.publish_comment(NOTHING_TO_APPLY).await?;
            return Ok(());
        }

        apply_to_pr(self.provider.as_ref(), &details, &suggestions).await?;
        self.provider.publish_comment(APPLIED_CONFIRMATION).await?;
        tracing::info!(pr = details.number, "applied suggestions via /apply");
        Ok(())
    }
}
