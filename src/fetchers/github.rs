use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::fetchers::common::{build_profile, filter_candidates, select_important_files, to_fetched_file};
use crate::fetchers::locator::RepoLocator;
use crate::fetchers::RepositoryFetcher;
use crate::types::FetchedContent;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("repo-analyzer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

/// Creates a GitHub client with the headers the REST API expects
pub(crate) fn create_github_client(config: &Config) -> Result<Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
    );
    if let Some(token) = &config.github_token {
        let value = reqwest::header::HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| AnalyzerError::Config("GitHub token contains invalid characters".into()))?;
        headers.insert(reqwest::header::AUTHORIZATION, value);
    }

    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.ingest.fetch_timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|e| AnalyzerError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Maps a non-success GitHub status to a fetch error
pub(crate) fn status_error(status: StatusCode, what: &str) -> AnalyzerError {
    match status {
        StatusCode::NOT_FOUND => AnalyzerError::Fetch(format!(
            "{} not found (HTTP 404); is the repository public?",
            what
        )),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => AnalyzerError::Fetch(format!(
            "GitHub refused the request for {} (HTTP {}); rate limit exceeded or token lacks access",
            what,
            status.as_u16()
        )),
        _ => AnalyzerError::Fetch(format!("Failed to fetch {}: HTTP {}", what, status)),
    }
}

/// Builds `<api base>/<segments...>`, percent-encoding each segment
pub(crate) fn api_url(api_base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(api_base)
        .map_err(|e| AnalyzerError::Config(format!("Invalid GitHub API base '{}': {}", api_base, e)))?;
    url.path_segments_mut()
        .map_err(|_| AnalyzerError::Config(format!("Invalid GitHub API base '{}'", api_base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Reads a GitHub repository through the REST API without touching disk
pub struct GitHubApiFetcher {
    client: Client,
    api_base: String,
}

impl GitHubApiFetcher {
    /// Creates a fetcher using the configured API base and token
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: create_github_client(config)?,
            api_base: config.ingest.github_api_base.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::Fetch(format!("Timed out fetching {}", what))
            } else {
                AnalyzerError::Fetch(format!("Failed to reach GitHub for {}: {}", what, e))
            }
        })?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), what));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AnalyzerError::Fetch(format!("Unexpected response for {}: {}", what, e)))
    }

    async fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let url = api_url(&self.api_base, &["repos", owner, repo])?;
        let info: RepoInfo = self.get_json(url, &format!("repository {}/{}", owner, repo)).await?;
        Ok(info.default_branch.unwrap_or_else(|| "main".to_string()))
    }

    async fn list_files(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<String>> {
        let mut segments = vec!["repos", owner, repo, "git", "trees"];
        segments.extend(branch.split('/'));
        let mut url = api_url(&self.api_base, &segments)?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let tree: TreeResponse = self.get_json(url, &format!("file tree of {}/{}", owner, repo)).await?;
        if tree.truncated {
            warn!("GitHub truncated the file tree of {}/{}; ranking a partial listing", owner, repo);
        }

        Ok(tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path)
            .collect())
    }

    async fn file_bytes(&self, owner: &str, repo: &str, branch: &str, path: &str) -> Result<Vec<u8>> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/'));
        let mut url = api_url(&self.api_base, &segments)?;
        url.query_pairs_mut().append_pair("ref", branch);

        let body: ContentResponse = self.get_json(url, path).await?;
        match (body.content, body.encoding.as_deref()) {
            (Some(content), Some("base64")) => {
                let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
                STANDARD
                    .decode(cleaned)
                    .map_err(|e| AnalyzerError::Fetch(format!("Bad base64 content for {}: {}", path, e)))
            }
            (Some(content), _) if !content.is_empty() => Ok(content.into_bytes()),
            // Files over 1 MB come back with `encoding: "none"` and no body.
            _ => Err(AnalyzerError::Fetch(format!("No inline content returned for {}", path))),
        }
    }
}

#[async_trait]
impl RepositoryFetcher for GitHubApiFetcher {
    fn name(&self) -> &'static str {
        "github-api"
    }

    fn accepts(&self, locator: &RepoLocator) -> bool {
        locator.github_slug().is_some()
    }

    async fn fetch(&self, locator: &RepoLocator, config: &Config) -> Result<FetchedContent> {
        let (owner, repo) = locator.github_slug().ok_or_else(|| {
            AnalyzerError::InvalidInput(format!("{} is not a GitHub repository", locator))
        })?;

        let branch = self.default_branch(owner, repo).await?;
        let all_paths = self.list_files(owner, repo, &branch).await?;
        let candidates = filter_candidates(&all_paths, config)?;
        let profile = build_profile(&all_paths, candidates.len());
        let selected = select_important_files(&candidates, config.ingest.max_files);

        info!(
            "Fetching {} of {} candidate files from {}/{}@{}",
            selected.len(),
            candidates.len(),
            owner,
            repo,
            branch
        );

        let mut files = Vec::with_capacity(selected.len());
        for path in &selected {
            match self.file_bytes(owner, repo, &branch, path).await {
                Ok(bytes) => {
                    if let Some(file) = to_fetched_file(path, &bytes, config.ingest.max_file_chars) {
                        files.push(file);
                    }
                }
                Err(e) => warn!("Skipping {}: {}", path, e),
            }
        }

        if files.is_empty() {
            return Err(AnalyzerError::Fetch(format!(
                "no readable source files in {}/{}",
                owner, repo
            )));
        }

        Ok(FetchedContent { files, profile })
    }
}
