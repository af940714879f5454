use serde::Serialize;

use super::position::{HunkPositionResolver, Position};
use super::suggestions::RawSuggestion;

/// An inline review comment ready for the "create review" API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewComment {
    pub path: String,
    pub position: Position,
    pub body: String,
}

/// Body of an inline comment carrying a GitHub suggested change.
pub fn suggestion_body(replacement: &str) -> String {
    format!("```suggestion\n{replacement}\n```")
}

/// Anchor extracted suggestions to positions in the PR diff.
///
/// Each suggestion is resolved by its target line first. Model-written
/// fragments number lines against their own minimal context, so when that
/// misses, the whole replacement is looked up as a run of the file's added
/// lines, nearest the target line. Replacements opening with a line that has
/// no letters or digits (`}`, blank) are too ambiguous for that lookup.
/// Suggestions that resolve neither way are dropped.
pub fn anchor_suggestions(diff_text: &str, suggestions: &[RawSuggestion]) -> Vec<ReviewComment> {
    if suggestions.is_empty() {
        return Vec::new();
    }
    let resolver = HunkPositionResolver::new(diff_text);

    suggestions
        .iter()
        .filter_map(|suggestion| {
            let position = resolver
                .resolve(&suggestion.file_path, suggestion.line)
                .or_else(|| {
                    let block: Vec<&str> = suggestion.replacement.lines().collect();
                    if !block.first()?.chars().any(char::is_alphanumeric) {
                        return None;
                    }
                    resolver.resolve_block_near(&suggestion.file_path, &block, suggestion.line)
                });
            match position {
                Some(position) => Some(ReviewComment {
                    path: suggestion.file_path.clone(),
                    position,
                    body: suggestion_body(&suggestion.replacement),
                }),
                None => {
                    tracing::warn!(
                        file = %suggestion.file_path,
                        line = suggestion.line,
                        "could not map suggestion to a diff position, dropping"
                    );
                    None
                }
            }
        })
        .collect()
}
