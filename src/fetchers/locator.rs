use crate::error::{AnalyzerError, Result};
use crate::utils::normalize_user_input;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use url::Url;

const GITHUB_HOSTS: &[&str] = &["github.com", "www.github.com"];

static NAME_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("static regex"));

/// Where a repository lives, as far as ingestion is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocation {
    /// Hosted on github.com
    GitHub { owner: String, repo: String },
    /// Any other http(s) git remote
    Remote,
    /// A checkout on this machine (`file://` URL)
    Local { path: PathBuf },
}

/// A validated, normalised repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    url: Url,
    location: RepoLocation,
}

impl RepoLocator {
    /// Validates `input` and works out where the repository lives.
    ///
    /// Query strings and fragments are dropped, GitHub URLs are reduced to
    /// `https://github.com/<owner>/<repo>` so deep links such as
    /// `/tree/main/src` analyse the whole repository.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = normalize_user_input(input);
        if raw.is_empty() {
            return Err(AnalyzerError::InvalidInput("repo_url must not be empty".into()));
        }

        let mut url = Url::parse(raw).map_err(|e| {
            AnalyzerError::InvalidInput(format!("'{}' is not a valid URL: {}", raw, e))
        })?;
        url.set_query(None);
        url.set_fragment(None);

        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|_| {
                    AnalyzerError::InvalidInput(format!("'{}' is not a usable file URL", raw))
                })?;
                Ok(Self { url, location: RepoLocation::Local { path } })
            }
            "http" | "https" => {
                let host = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| AnalyzerError::InvalidInput(format!("'{}' has no host", raw)))?
                    .to_lowercase();

                if GITHUB_HOSTS.contains(&host.as_str()) {
                    let (owner, repo) = github_segments(&url)?;
                    let canonical = Url::parse(&format!("https://github.com/{}/{}", owner, repo))?;
                    Ok(Self { url: canonical, location: RepoLocation::GitHub { owner, repo } })
                } else {
                    Ok(Self { url, location: RepoLocation::Remote })
                }
            }
            other => Err(AnalyzerError::InvalidInput(format!(
                "unsupported URL scheme '{}': expected http, https or file",
                other
            ))),
        }
    }

    /// The normalised URL
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn location(&self) -> &RepoLocation {
        &self.location
    }

    /// `owner/repo` for GitHub repositories
    pub fn github_slug(&self) -> Option<(&str, &str)> {
        match &self.location {
            RepoLocation::GitHub { owner, repo } => Some((owner, repo)),
            _ => None,
        }
    }
}

impl fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn github_segments(url: &Url) -> Result<(String, String)> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < 2 {
        return Err(AnalyzerError::InvalidInput(format!(
            "'{}' must name both an owner and a repository",
            url
        )));
    }

    let owner = segments[0];
    let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);

    for name in [owner, repo] {
        if !NAME_SEGMENT.is_match(name) || name == "." || name == ".." {
            return Err(AnalyzerError::InvalidInput(format!(
                "'{}' is not a valid GitHub owner or repository name",
                name
            )));
        }
    }

    Ok((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("https://github.com/rust-lang/cargo", "rust-lang", "cargo" ; "plain")]
    #[test_case("https://github.com/rust-lang/cargo.git", "rust-lang", "cargo" ; "dot git suffix")]
    #[test_case("https://github.com/rust-lang/cargo?tab=readme", "rust-lang", "cargo" ; "query string")]
    #[test_case("https://www.github.com/rust-lang/cargo/tree/master/src", "rust-lang", "cargo" ; "deep link")]
    #[test_case(" \"https://GitHub.com/rust-lang/cargo/\" ", "rust-lang", "cargo" ; "quoted mixed case host")]
    fn test_github_urls(input: &str, owner: &str, repo: &str) {
        let locator = RepoLocator::parse(input).unwrap();
        assert_eq!(locator.github_slug(), Some((owner, repo)));
        assert_eq!(locator.as_str(), format!("https://github.com/{}/{}", owner, repo));
    }

    #[test_case("not-a-url" ; "no scheme")]
    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("ftp://example.com/repo" ; "unsupported scheme")]
    #[test_case("localhost:8080/repo" ; "host parsed as scheme")]
    #[test_case("https://github.com/rust-lang" ; "owner only")]
    #[test_case("https://github.com/rust-lang/%20bad" ; "bad repo name")]
    fn test_invalid_urls(input: &str) {
        let err = RepoLocator::parse(input).unwrap_err();
        assert_eq!(err.kind(), "InvalidInputError", "{}", err);
    }

    #[test]
    fn test_other_hosts_are_remote() {
        let locator = RepoLocator::parse("https://gitlab.com/group/project?x=1#top").unwrap();
        assert_eq!(locator.location(), &RepoLocation::Remote);
        assert_eq!(locator.as_str(), "https://gitlab.com/group/project");
    }

    #[test]
    fn test_file_urls_are_local() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();
        let locator = RepoLocator::parse(url.as_str()).unwrap();
        assert!(matches!(locator.location(), RepoLocation::Local { .. }));
    }
}
