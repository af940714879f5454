use crate::config::loader::default_settings;
use crate::config::types::Settings;
use crate::git::types::PrDetails;

/// PR diff whose single hunk replaces line 2 of `x.py`.
pub const PR_DIFF: &str = "diff --git a/x.py b/x.py\n@@ -1,3 +1,3 @@\n old\n-foo\n+bar\n old";

/// Two-file PR diff with multiple hunks.
pub const MULTI_FILE_DIFF: &str = r#"diff --git a/src/app.py b/src/app.py
index 1111111..2222222 100644
--- a/src/app.py
+++ b/src/app.py
@@ -1,4 +1,4 @@
 import os
-DEBUG = True
+DEBUG = False
 
 def main():
@@ -20,3 +20,4 @@ def main():
     run()
+    cleanup()
     return 0
 
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1,2 +1,3 @@
 # Project
+Some docs.
 
"#;

/// Model output with one anchorable suggestion, following the prompt's layout.
pub const ANALYSIS_WITH_SUGGESTION: &str = r#"## Summary
Renames a variable.

### Scores
- Code Quality: 8/10

### Code Suggestions
- Prefer a clearer value:

```diff
--- a/x.py
+++ b/x.py
@@ -2,1 +2,1 @@
-foo
+bar
```

### Next Steps
- Merge after CI passes."#;

/// Model output without any diff block.
pub const ANALYSIS_WITHOUT_SUGGESTIONS: &str = "## Summary\nNothing to change.\n\n### Next Steps\n- Merge.";

/// PR details for `x.py` carrying [`PR_DIFF`].
pub fn sample_pr_details() -> PrDetails {
    PrDetails {
        number: 7,
        title: "Fix parser".into(),
        body: "Replaces foo with bar".into(),
        author: "octocat".into(),
        files_changed: vec!["x.py".into()],
        diff: PR_DIFF.into(),
        base_branch: "main".into(),
        head_branch: "feature/parser".into(),
        head_sha: "abc123".into(),
    }
}

/// Defaults from the embedded configuration, no files or env applied.
pub fn sample_settings() -> Settings {
    default_settings().expect("embedded settings should parse")
}
