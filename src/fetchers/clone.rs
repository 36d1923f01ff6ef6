use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::fetchers::common::collect_local;
use crate::fetchers::locator::{RepoLocation, RepoLocator};
use crate::fetchers::RepositoryFetcher;
use crate::types::FetchedContent;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command as TokioCommand;
use tracing::info;

// Clones take longer than single API calls.
const CLONE_TIMEOUT_MULTIPLIER: u64 = 4;

/// Shallow-clones any http(s) git remote with the system `git`
pub struct CloneFetcher {
    timeout: Duration,
}

impl CloneFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.ingest.fetch_timeout_secs * CLONE_TIMEOUT_MULTIPLIER),
        }
    }

    /// `git clone --depth 1` arguments for `url` into `dest`
    pub fn clone_args(url: &str, dest: &Path) -> Vec<String> {
        vec![
            "clone".to_string(),
            "--depth".to_string(),
            "1".to_string(),
            "--quiet".to_string(),
            "--".to_string(),
            url.to_string(),
            dest.to_string_lossy().to_string(),
        ]
    }

    async fn clone_into(&self, url: &str, dest: &Path) -> Result<()> {
        let child = TokioCommand::new("git")
            .args(Self::clone_args(url, dest))
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AnalyzerError::Fetch(format!("git is not available: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AnalyzerError::Fetch(format!("git clone timed out after {:?}", self.timeout)))?
            .map_err(|e| AnalyzerError::Fetch(format!("git clone failed: {}", e)))?;

        if !output.status.success() {
            return Err(AnalyzerError::Fetch(format!(
                "Failed to clone repository. Is the URL correct and public? {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryFetcher for CloneFetcher {
    fn name(&self) -> &'static str {
        "git-clone"
    }

    fn accepts(&self, locator: &RepoLocator) -> bool {
        !matches!(locator.location(), RepoLocation::Local { .. })
    }

    async fn fetch(&self, locator: &RepoLocator, config: &Config) -> Result<FetchedContent> {
        let temp_dir = TempDir::new()?;
        let dest = temp_dir.path().join("repo");

        info!("Cloning {}", locator);
        self.clone_into(locator.as_str(), &dest).await?;

        collect_local(dest, config).await
    }
}
