use url::Url;

use crate::error::HarperBotError;

/// Owner, repository and number of a GitHub pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl ParsedPrUrl {
    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Validate that a PR number is non-zero.
fn validate_pr_number(num: u64, raw: &str) -> Result<u64, HarperBotError> {
    if num == 0 {
        return Err(HarperBotError::Other(format!(
            "invalid PR number: '{raw}' (must be >= 1)"
        )));
    }
    Ok(num)
}

fn parse_pr_number(raw: &str) -> Result<u64, HarperBotError> {
    let num = raw
        .parse::<u64>()
        .map_err(|_| HarperBotError::Other(format!("cannot parse PR number: '{raw}'")))?;
    validate_pr_number(num, raw)
}

/// Parse a GitHub pull request URL.
///
/// Accepts web URLs (`https://github.com/{owner}/{repo}/pull/{n}`, with any
/// trailing `/files`-style suffix) and API URLs
/// (`https://api.github.com/repos/{owner}/{repo}/pulls/{n}`, including
/// GitHub Enterprise `/api/v3` prefixes).
pub fn parse_pr_url(pr_url: &str) -> Result<ParsedPrUrl, HarperBotError> {
    let url =
        Url::parse(pr_url).map_err(|e| HarperBotError::Other(format!("invalid URL: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| HarperBotError::Other("URL has no host".into()))?;

    let raw_path = url.path();
    let cleaned_path = raw_path.strip_prefix("/api/v3").unwrap_or(raw_path);
    let parts: Vec<&str> = cleaned_path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // API URL: /repos/{owner}/{repo}/pulls/{pr_number}
    if host.starts_with("api.") || raw_path.starts_with("/api/v3") {
        return match parts.as_slice() {
            ["repos", owner, repo, "pulls" | "issues", number, ..] => Ok(ParsedPrUrl {
                owner: owner.to_string(),
                repo: repo.to_string(),
                pr_number: parse_pr_number(number)?,
            }),
            _ => Err(HarperBotError::Other(format!(
                "invalid GitHub API PR URL: {pr_url}"
            ))),
        };
    }

    // Web URL: /{owner}/{repo}/pull/{pr_number}
    match parts.as_slice() {
        [owner, repo, "pull", number, ..] => Ok(ParsedPrUrl {
            owner: owner.to_string(),
            repo: repo.to_string(),
            pr_number: parse_pr_number(number)?,
        }),
        _ => Err(HarperBotError::Other(format!(
            "not a GitHub pull request URL: {pr_url}"
        ))),
    }
}

/// Parse `owner/repo` into its two halves.
pub fn parse_repo_name(full_name: &str) -> Result<(String, String), HarperBotError> {
    match full_name.trim().split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(HarperBotError::Other(format!(
            "expected repository as 'owner/repo', got '{full_name}'"
        ))),
    }
}
