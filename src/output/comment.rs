//! Markdown for the main analysis comment.

const BADGE: &str = "[![HarperBot](https://github.com/bniladridas/friday_gemini_ai/actions/workflows/harperbot.yml/badge.svg)](https://github.com/bniladridas/friday_gemini_ai/actions/workflows/harperbot.yml)";

const SUGGESTIONS_HEADER: &str = "### Code Suggestions\n";
const SUGGESTIONS_NOTICE: &str = "- Suggestions posted as inline comments below.\n";

/// Create a collapsible `<details>` section (GitHub Flavored Markdown).
pub fn collapsible_section(summary: &str, body: &str) -> String {
    format!("<details>\n<summary>{summary}</summary>\n\n{body}\n\n</details>")
}

/// Wrap the analysis in the badge header and a collapsed section.
pub fn format_comment(analysis: &str) -> String {
    format!(
        "{BADGE}\n\n{}\n\n---",
        collapsible_section("HarperBot Analysis", analysis)
    )
}

/// Replace the body of the `### Code Suggestions` section with a pointer to
/// the inline review. The section runs to the next `###` heading or the end.
/// Text without that section is returned unchanged.
pub fn update_main_comment(analysis: &str) -> String {
    let Some(start) = analysis.find(SUGGESTIONS_HEADER) else {
        return analysis.to_string();
    };
    let body_start = start + SUGGESTIONS_HEADER.len();
    let end = analysis[body_start..]
        .find("###")
        .map_or(analysis.len(), |i| body_start + i);

    format!(
        "{}{SUGGESTIONS_HEADER}{SUGGESTIONS_NOTICE}{}",
        &analysis[..start],
        &analysis[end..]
    )
}
