//! Pull code suggestions out of free-form model output.
//!
//! The model is asked to express each suggestion as a fenced `diff` block
//! holding a minimal unified-diff fragment:
//!
//! ````text
//! ```diff
//! --- a/src/app.py
//! +++ b/src/app.py
//! @@ -10,1 +10,1 @@
//! -old
//! +new
//! ```
//! ````

use serde::Serialize;

use super::diff::{HunkHeader, LineKind, classify_line};

const FENCE_OPEN: &str = "```diff\n";
const FENCE_CLOSE: &str = "\n```";

/// A suggestion as written by the model, before anchoring to the PR diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSuggestion {
    pub file_path: String,
    /// New-file line the replacement targets (the fragment hunk's `new_start`).
    pub line: u32,
    /// Replacement lines joined with `\n`, markers stripped.
    pub replacement: String,
}

/// Extract every suggestion from `text`, in encounter order.
pub fn extract(text: &str) -> Vec<RawSuggestion> {
    diff_blocks(text).flat_map(parse_diff_block).collect()
}

/// Iterate over the bodies of fenced `diff` blocks.
///
/// A block opened without a matching close ends the scan.
pub fn diff_blocks(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let open = rest.find(FENCE_OPEN)?;
        let body_start = open + FENCE_OPEN.len();
        let close = rest[body_start..].find(FENCE_CLOSE)?;
        let body = &rest[body_start..body_start + close];
        rest = &rest[body_start + close + FENCE_CLOSE.len()..];
        Some(body)
    })
}

/// Parse one diff fragment into zero or more suggestions, one per hunk that
/// adds at least one line.
pub fn parse_diff_block(block: &str) -> Vec<RawSuggestion> {
    let mut lines = block.trim().lines();
    let Some(file_path) = lines
        .next()
        .and_then(|first| first.strip_prefix("--- a/"))
        .map(str::trim_end)
        .filter(|path| !path.is_empty())
    else {
        return Vec::new();
    };

    let mut suggestions = Vec::new();
    let mut hunk_start: Option<u32> = None;
    let mut added: Vec<&str> = Vec::new();

    let mut flush = |start: Option<u32>, added: &mut Vec<&str>| {
        if let Some(line) = start
            && !added.is_empty()
        {
            suggestions.push(RawSuggestion {
                file_path: file_path.to_string(),
                line,
                replacement: added.join("\n"),
            });
        }
        added.clear();
    };

    for line in lines {
        match classify_line(line) {
            LineKind::HunkHeader => {
                flush(hunk_start, &mut added);
                hunk_start = HunkHeader::parse(line).map(|h| h.new_start);
            }
            LineKind::Added if hunk_start.is_some() => added.push(&line[1..]),
            _ => {}
        }
    }
    flush(hunk_start, &mut added);

    if suggestions.is_empty() {
        tracing::debug!(file = file_path, "diff block yielded no suggestions");
    }
    suggestions
}
