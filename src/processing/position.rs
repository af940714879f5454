//! Convert new-file line numbers into review-comment positions.
//!
//! A position is the 1-based ordinal of a line inside one hunk body, counting
//! context, added and removed lines alike (and the `\ No newline` marker).
//! It restarts at 1 for every hunk.

use serde::Serialize;
use std::fmt;

use super::diff::{FileDiff, Hunk, HunkLine, UnifiedDiff};

/// 1-based position of a line within a hunk body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Position(pub u32);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A hunk body line together with its position and, for lines present in the
/// new file, its new-file line number.
#[derive(Debug, Clone, Copy)]
pub struct WalkedLine<'a> {
    pub position: Position,
    pub new_line: Option<u32>,
    pub line: &'a HunkLine,
}

/// Forward-only cursor over one hunk body.
pub struct HunkWalk<'a> {
    lines: std::slice::Iter<'a, HunkLine>,
    new_line_cursor: u32,
    position_cursor: u32,
}

impl<'a> HunkWalk<'a> {
    pub fn new(hunk: &'a Hunk) -> Self {
        Self {
            lines: hunk.lines.iter(),
            new_line_cursor: hunk.new_start,
            position_cursor: 0,
        }
    }
}

impl<'a> Iterator for HunkWalk<'a> {
    type Item = WalkedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.position_cursor = self.position_cursor.saturating_add(1);
        let new_line = line.in_new_file().then(|| {
            let current = self.new_line_cursor;
            self.new_line_cursor = self.new_line_cursor.saturating_add(1);
            current
        });
        Some(WalkedLine {
            position: Position(self.position_cursor),
            new_line,
            line,
        })
    }
}

/// Resolves positions against a diff parsed once up front.
///
/// Use this when anchoring many suggestions against the same diff; the free
/// function [`resolve`] parses on every call.
#[derive(Debug, Clone)]
pub struct HunkPositionResolver {
    diff: UnifiedDiff,
}

impl HunkPositionResolver {
    pub fn new(diff_text: &str) -> Self {
        Self {
            diff: UnifiedDiff::parse(diff_text),
        }
    }

    /// Position of the added line that lands at `new_file_line` in `file_path`.
    ///
    /// Context and removed lines never match. Returns `None` for an empty
    /// path, a zero line number, or a file absent from the diff.
    pub fn resolve(&self, file_path: &str, new_file_line: u32) -> Option<Position> {
        if file_path.is_empty() || new_file_line == 0 {
            return None;
        }
        self.added_lines(file_path)
            .find(|walked| walked.new_line == Some(new_file_line))
            .map(|walked| walked.position)
    }

    /// Position of the first line of a run of consecutive added lines in
    /// `file_path` equal to `block`, ignoring trailing whitespace. When several
    /// runs match, the one starting closest to `near` wins.
    pub fn resolve_block_near(&self, file_path: &str, block: &[&str], near: u32) -> Option<Position> {
        if file_path.is_empty() || block.is_empty() {
            return None;
        }
        let mut best: Option<(u32, Position)> = None;
        for hunk in self.diff.files_named(file_path).flat_map(|f: &FileDiff| f.hunks.iter()) {
            let walked: Vec<WalkedLine<'_>> = HunkWalk::new(hunk).collect();
            for run in walked.windows(block.len()) {
                let matches = run.iter().zip(block).all(|(walked, wanted)| {
                    matches!(walked.line, HunkLine::Added(t) if t.trim_end() == wanted.trim_end())
                });
                let Some(start) = run[0].new_line.filter(|_| matches) else {
                    continue;
                };
                let distance = start.abs_diff(near);
                if best.is_none_or(|(d, _)| distance < d) {
                    best = Some((distance, run[0].position));
                }
            }
        }
        best.map(|(_, position)| position)
    }

    fn added_lines<'a>(&'a self, file_path: &'a str) -> impl Iterator<Item = WalkedLine<'a>> {
        self.diff
            .files_named(file_path)
            .flat_map(|file: &FileDiff| file.hunks.iter())
            .flat_map(HunkWalk::new)
            .filter(|walked| matches!(walked.line, HunkLine::Added(_)))
    }
}

/// Resolve a new-file line number to its position in `diff_text`.
pub fn resolve(diff_text: &str, file_path: &str, new_file_line: u32) -> Option<Position> {
    HunkPositionResolver::new(diff_text).resolve(file_path, new_file_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_HUNK: &str = "\
diff --git a/src/app.py b/src/app.py
index 1111111..2222222 100644
--- a/src/app.py
+++ b/src/app.py
@@ -1,3 +1,3 @@
 old1
-old2
+new2
 old3
";

    #[test]
    fn test_resolve_added_line_in_single_hunk() {
        assert_eq!(resolve(SINGLE_HUNK, "src/app.py", 2), Some(Position(3)));
    }

    #[test]
    fn test_context_lines_never_match() {
        assert_eq!(resolve(SINGLE_HUNK, "src/app.py", 1), None);
        assert_eq!(resolve(SINGLE_HUNK, "src/app.py", 3), None);
    }

    #[test]
    fn test_absent_file_is_none() {
        for line in 1..=5 {
            assert_eq!(resolve(SINGLE_HUNK, "src/other.py", line), None);
        }
    }

    #[test]
    fn test_exact_path_match_only() {
        // "app.py" is a suffix of "src/app.py" but must not match
        assert_eq!(resolve(SINGLE_HUNK, "app.py", 2), None);
        assert_eq!(resolve(SINGLE_HUNK, "src/app.p", 2), None);
    }

    #[test]
    fn test_removed_lines_do_not_advance_new_line() {
        let diff = "diff --git a/f b/f\n@@ -5,2 +5,1 @@\n-a\n-b\n+c\n";
        assert_eq!(resolve(diff, "f", 5), Some(Position(3)));
        assert_eq!(resolve(diff, "f", 6), None);
    }

    #[test]
    fn test_position_restarts_per_hunk() {
        let diff = "\
diff --git a/f b/f
@@ -1,2 +1,2 @@
 keep
-old
+new
@@ -20,2 +20,3 @@
 ctx
+added1
+added2
 ctx
";
        assert_eq!(resolve(diff, "f", 2), Some(Position(3)));
        assert_eq!(resolve(diff, "f", 21), Some(Position(2)));
        assert_eq!(resolve(diff, "f", 22), Some(Position(3)));
    }

    #[test]
    fn test_multi_file_diff_resolves_second_file() {
        let diff = format!("{SINGLE_HUNK}diff --git a/b.rs b/b.rs\n@@ -0,0 +1,2 @@\n+fn a() {{}}\n+fn b() {{}}\n");
        assert_eq!(resolve(&diff, "b.rs", 2), Some(Position(2)));
        assert_eq!(resolve(&diff, "src/app.py", 2), Some(Position(3)));
    }

    #[test]
    fn test_no_newline_marker_takes_position_without_advancing() {
        let diff = "\
diff --git a/f b/f
@@ -1,1 +1,2 @@
-last
\\ No newline at end of file
+last
+extra
";
        assert_eq!(resolve(diff, "f", 1), Some(Position(3)));
        assert_eq!(resolve(diff, "f", 2), Some(Position(4)));
    }

    #[test]
    fn test_degenerate_inputs_are_none() {
        assert_eq!(resolve("", "f", 1), None);
        assert_eq!(resolve(SINGLE_HUNK, "", 2), None);
        assert_eq!(resolve(SINGLE_HUNK, "src/app.py", 0), None);
        assert_eq!(resolve("not a diff at all\n+++\n@@", "f", 1), None);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolver = HunkPositionResolver::new(SINGLE_HUNK);
        let first = resolver.resolve("src/app.py", 2);
        assert_eq!(resolver.resolve("src/app.py", 2), first);
        assert_eq!(resolve(SINGLE_HUNK, "src/app.py", 2), first);
    }

    #[test]
    fn test_resolve_block_near_needs_whole_run() {
        let resolver = HunkPositionResolver::new(SINGLE_HUNK);
        assert_eq!(resolver.resolve_block_near("src/app.py", &["new2"], 2), Some(Position(3)));
        assert_eq!(resolver.resolve_block_near("src/app.py", &["new2", "old3"], 2), None);
        assert_eq!(resolver.resolve_block_near("src/app.py", &[], 2), None);
    }

    #[test]
    fn test_resolve_block_near_prefers_closest_run() {
        let diff = "\
diff --git a/f b/f
@@ -1,1 +1,2 @@
 a
+let total = 0;
@@ -40,2 +41,3 @@
 b
 c
+let total = 0;
";
        let resolver = HunkPositionResolver::new(diff);
        assert_eq!(resolver.resolve_block_near("f", &["let total = 0;"], 3), Some(Position(2)));
        assert_eq!(resolver.resolve_block_near("f", &["let total = 0;"], 40), Some(Position(3)));
    }

    #[test]
    fn test_hunk_walk_tracks_both_counters() {
        let parsed = UnifiedDiff::parse(SINGLE_HUNK);
        let walked: Vec<_> = HunkWalk::new(&parsed.files[0].hunks[0])
            .map(|w| (w.position.0, w.new_line))
            .collect();
        assert_eq!(walked, vec![(1, Some(1)), (2, None), (3, Some(2)), (4, Some(3))]);
    }

    #[test]
    fn test_position_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Position(7)).unwrap(), "7");
        assert_eq!(Position(7).to_string(), "7");
    }
}
