use regex::Regex;
use std::sync::LazyLock;

/// Regex for parsing unified diff hunk headers.
/// Matches: `@@ -start1[,size1] +start2[,size2] @@ [section_header]`
static HUNK_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@[ ]?(.*)").unwrap());

/// Parsed hunk header values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_len: u32,
    pub new_start: u32,
    pub new_len: u32,
    pub section_header: String,
}

impl HunkHeader {
    /// Parse a `@@ ... @@` line. Returns `None` for malformed headers,
    /// including numbers that do not fit in a `u32`.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = HUNK_HEADER_RE.captures(line)?;
        Some(Self {
            old_start: caps[1].parse().ok()?,
            old_len: match caps.get(2) {
                Some(m) => m.as_str().parse().ok()?,
                None => 1,
            },
            new_start: caps[3].parse().ok()?,
            new_len: match caps.get(4) {
                Some(m) => m.as_str().parse().ok()?,
                None => 1,
            },
            section_header: caps.get(5).map_or("", |m| m.as_str()).to_string(),
        })
    }
}

/// Classification of a single raw diff line.
///
/// Body kinds (`Added`, `Removed`, `Context`, `NoNewline`) only carry meaning
/// inside a hunk; before a file's first hunk header the same prefixes belong
/// to file metadata (`--- a/...`, `+++ b/...`, `index ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `diff --git a/<old> b/<new>`
    FileHeader,
    /// Any line starting with `@@`, well-formed or not.
    HunkHeader,
    Added,
    Removed,
    Context,
    /// `\ No newline at end of file`
    NoNewline,
}

/// Classify a line by its leading marker.
pub fn classify_line(line: &str) -> LineKind {
    if line.starts_with("diff --git ") {
        LineKind::FileHeader
    } else if line.starts_with("@@") {
        LineKind::HunkHeader
    } else if line.starts_with('+') {
        LineKind::Added
    } else if line.starts_with('-') {
        LineKind::Removed
    } else if line.starts_with('\\') {
        LineKind::NoNewline
    } else {
        // ' ' prefix, or an empty line where trailing whitespace was stripped
        LineKind::Context
    }
}

/// One line of a hunk body, marker stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Added(String),
    Removed(String),
    NoNewline,
}

impl HunkLine {
    /// Whether this line exists in the new file (advances the new-file line counter).
    pub fn in_new_file(&self) -> bool {
        matches!(self, HunkLine::Context(_) | HunkLine::Added(_))
    }

    fn from_body_line(kind: LineKind, line: &str) -> Option<Self> {
        let text = line.get(1..).unwrap_or_default().to_string();
        match kind {
            LineKind::Added => Some(HunkLine::Added(text)),
            LineKind::Removed => Some(HunkLine::Removed(text)),
            LineKind::Context => Some(HunkLine::Context(text)),
            LineKind::NoNewline => Some(HunkLine::NoNewline),
            LineKind::FileHeader | LineKind::HunkHeader => None,
        }
    }
}

/// A contiguous region of change introduced by a `@@` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based line in the new file where the hunk body begins.
    pub new_start: u32,
    pub lines: Vec<HunkLine>,
}

/// All hunks of one file, keyed by the new-file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub hunks: Vec<Hunk>,
}

/// A parsed multi-file unified diff. Never mutated after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedDiff {
    pub files: Vec<FileDiff>,
}

impl UnifiedDiff {
    /// Parse unified diff text with a single forward pass.
    ///
    /// Malformed pieces are skipped rather than reported: a file header whose
    /// path cannot be read drops that file's span, and a malformed hunk header
    /// drops the body lines that follow it up to the next header.
    pub fn parse(text: &str) -> Self {
        let mut cursor = ParseCursor::default();
        for line in text.lines() {
            cursor.advance(line);
        }
        cursor.finish()
    }

    /// Iterate over the file diffs whose new-file path equals `path` exactly.
    pub fn files_named<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a FileDiff> {
        self.files.iter().filter(move |f| f.path == path)
    }
}

/// Forward-only state for [`UnifiedDiff::parse`].
#[derive(Default)]
struct ParseCursor {
    files: Vec<FileDiff>,
    current_file: Option<FileDiff>,
    current_hunk: Option<Hunk>,
    /// True between a file header and that file's first hunk header.
    in_preamble: bool,
}

impl ParseCursor {
    fn advance(&mut self, line: &str) {
        match classify_line(line) {
            LineKind::FileHeader => {
                self.flush_file();
                self.current_file = parse_file_header(line).map(|path| FileDiff {
                    path,
                    hunks: Vec::new(),
                });
                self.in_preamble = true;
            }
            LineKind::HunkHeader => {
                self.flush_hunk();
                self.in_preamble = false;
                if self.current_file.is_none() {
                    return;
                }
                match HunkHeader::parse(line) {
                    Some(header) => {
                        self.current_hunk = Some(Hunk {
                            new_start: header.new_start,
                            lines: Vec::new(),
                        });
                    }
                    None => tracing::debug!(line, "skipping malformed hunk header"),
                }
            }
            kind if self.in_preamble => {
                // `+++ b/<path>` is the most reliable source of the new-file path
                if kind == LineKind::Added
                    && let Some(path) = line.strip_prefix("+++ b/")
                    && let Some(file) = self.current_file.as_mut()
                {
                    file.path = path.trim_end().to_string();
                }
            }
            kind => {
                if let Some(hunk) = self.current_hunk.as_mut()
                    && let Some(body) = HunkLine::from_body_line(kind, line)
                {
                    hunk.lines.push(body);
                }
            }
        }
    }

    fn flush_hunk(&mut self) {
        if let Some(hunk) = self.current_hunk.take()
            && let Some(file) = self.current_file.as_mut()
        {
            file.hunks.push(hunk);
        }
    }

    fn flush_file(&mut self) {
        self.flush_hunk();
        if let Some(file) = self.current_file.take() {
            self.files.push(file);
        }
    }

    fn finish(mut self) -> UnifiedDiff {
        self.flush_file();
        UnifiedDiff { files: self.files }
    }
}

/// Extract the new-file path from a `diff --git a/<old> b/<new>` header.
///
/// When both sides are identical (the common, non-rename case) the split is
/// unambiguous even if the path contains spaces. Otherwise the last ` b/`
/// separator wins. Quoted paths (`"a/x" "b/x"`) are unquoted.
pub fn parse_file_header(line: &str) -> Option<String> {
    let rest = line.strip_prefix("diff --git ")?.trim_end();

    if let Some(quoted) = rest.strip_suffix('"')
        && let Some(idx) = quoted.rfind(" \"b/")
    {
        let path = &quoted[idx + 4..];
        return (!path.is_empty()).then(|| path.to_string());
    }

    // "a/" + P + " b/" + P
    if rest.starts_with("a/") && rest.len() >= 5 && (rest.len() - 5) % 2 == 0 {
        let p = (rest.len() - 5) / 2;
        if let (Some(old), Some(sep), Some(new)) =
            (rest.get(2..2 + p), rest.get(2 + p..5 + p), rest.get(5 + p..))
            && sep == " b/"
            && old == new
            && !new.is_empty()
        {
            return Some(new.to_string());
        }
    }

    let idx = rest.rfind(" b/")?;
    let path = &rest[idx + 3..];
    (!path.is_empty()).then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunk_header_parse() {
        let h = HunkHeader::parse("@@ -10,5 +20,7 @@ fn main()").unwrap();
        assert_eq!(h.old_start, 10);
        assert_eq!(h.old_len, 5);
        assert_eq!(h.new_start, 20);
        assert_eq!(h.new_len, 7);
        assert_eq!(h.section_header, "fn main()");
    }

    #[test]
    fn test_hunk_header_without_lengths() {
        let h = HunkHeader::parse("@@ -3 +4 @@").unwrap();
        assert_eq!(h.old_start, 3);
        assert_eq!(h.old_len, 1);
        assert_eq!(h.new_start, 4);
        assert_eq!(h.new_len, 1);
        assert_eq!(h.section_header, "");
    }

    #[test]
    fn test_hunk_header_malformed() {
        assert!(HunkHeader::parse("@@ garbage @@").is_none());
        assert!(HunkHeader::parse("@@ -1,2 +x,3 @@").is_none());
        assert!(HunkHeader::parse("@@ -1 +99999999999 @@").is_none());
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("diff --git a/x b/x"), LineKind::FileHeader);
        assert_eq!(classify_line("@@ -1 +1 @@"), LineKind::HunkHeader);
        assert_eq!(classify_line("+added"), LineKind::Added);
        assert_eq!(classify_line("-removed"), LineKind::Removed);
        assert_eq!(classify_line(" context"), LineKind::Context);
        assert_eq!(classify_line(""), LineKind::Context);
        assert_eq!(
            classify_line("\\ No newline at end of file"),
            LineKind::NoNewline
        );
    }

    #[test]
    fn test_parse_file_header_simple() {
        assert_eq!(
            parse_file_header("diff --git a/src/main.rs b/src/main.rs").as_deref(),
            Some("src/main.rs")
        );
    }

    #[test]
    fn test_parse_file_header_with_spaces() {
        assert_eq!(
            parse_file_header("diff --git a/docs/my b/file.md b/docs/my b/file.md").as_deref(),
            Some("docs/my b/file.md")
        );
    }

    #[test]
    fn test_parse_file_header_rename() {
        assert_eq!(
            parse_file_header("diff --git a/old.rs b/new.rs").as_deref(),
            Some("new.rs")
        );
    }

    #[test]
    fn test_parse_file_header_quoted() {
        assert_eq!(
            parse_file_header(r#"diff --git "a/we ird.txt" "b/we ird.txt""#).as_deref(),
            Some("we ird.txt")
        );
    }

    #[test]
    fn test_parse_file_header_invalid() {
        assert!(parse_file_header("diff --git").is_none());
        assert!(parse_file_header("diff --git a/x").is_none());
        assert!(parse_file_header("--- a/x").is_none());
    }

    #[test]
    fn test_parse_multi_file_diff() {
        let diff = "\
diff --git a/a.py b/a.py
index 83db48f..bf269f4 100644
--- a/a.py
+++ b/a.py
@@ -1,2 +1,2 @@
-x = 1
+x = 2
 y = 3
@@ -10 +10,2 @@ def f():
 return
+pass
diff --git a/b.py b/b.py
new file mode 100644
--- /dev/null
+++ b/b.py
@@ -0,0 +1 @@
+print('hi')
\\ No newline at end of file
";
        let parsed = UnifiedDiff::parse(diff);
        assert_eq!(parsed.files.len(), 2);

        let a = &parsed.files[0];
        assert_eq!(a.path, "a.py");
        assert_eq!(a.hunks.len(), 2);
        assert_eq!(a.hunks[0].new_start, 1);
        assert_eq!(
            a.hunks[0].lines,
            vec![
                HunkLine::Removed("x = 1".into()),
                HunkLine::Added("x = 2".into()),
                HunkLine::Context("y = 3".into()),
            ]
        );
        assert_eq!(a.hunks[1].new_start, 10);

        let b = &parsed.files[1];
        assert_eq!(b.path, "b.py");
        assert_eq!(
            b.hunks[0].lines,
            vec![HunkLine::Added("print('hi')".into()), HunkLine::NoNewline]
        );
    }

    #[test]
    fn test_preamble_lines_are_not_hunk_body() {
        let diff = "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b";
        let parsed = UnifiedDiff::parse(diff);
        assert_eq!(parsed.files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_body_lines_resembling_headers_inside_hunk() {
        // A removed line "-- a/x" renders as "--- a/x" inside a hunk body
        let diff = "diff --git a/x b/x\n@@ -1,2 +1,2 @@\n--- a/x\n+++ b/y\n";
        let parsed = UnifiedDiff::parse(diff);
        assert_eq!(parsed.files[0].path, "x");
        assert_eq!(
            parsed.files[0].hunks[0].lines,
            vec![
                HunkLine::Removed("-- a/x".into()),
                HunkLine::Added("++ b/y".into()),
            ]
        );
    }

    #[test]
    fn test_malformed_hunk_header_drops_its_body() {
        let diff = "diff --git a/x b/x\n@@ nonsense @@\n+lost\n@@ -5 +5 @@\n+kept";
        let parsed = UnifiedDiff::parse(diff);
        let hunks = &parsed.files[0].hunks;
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].new_start, 5);
        assert_eq!(hunks[0].lines, vec![HunkLine::Added("kept".into())]);
    }

    #[test]
    fn test_hunk_before_any_file_header_is_ignored() {
        let parsed = UnifiedDiff::parse("@@ -1 +1 @@\n+orphan");
        assert!(parsed.files.is_empty());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(UnifiedDiff::parse(""), UnifiedDiff::default());
    }

    #[test]
    fn test_files_named_is_exact() {
        let diff = "diff --git a/src/x.py b/src/x.py\n@@ -1 +1 @@\n+a\ndiff --git a/x.py b/x.py\n@@ -1 +1 @@\n+b";
        let parsed = UnifiedDiff::parse(diff);
        let matched: Vec<_> = parsed.files_named("x.py").collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].hunks[0].lines, vec![HunkLine::Added("b".into())]);
    }
}
