use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::fetchers::common::collect_local;
use crate::fetchers::locator::{RepoLocation, RepoLocator};
use crate::fetchers::RepositoryFetcher;
use crate::types::FetchedContent;
use async_trait::async_trait;

/// Reads a checkout named by a `file://` URL
pub struct LocalFetcher;

impl LocalFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryFetcher for LocalFetcher {
    fn name(&self) -> &'static str {
        "local"
    }

    fn accepts(&self, locator: &RepoLocator) -> bool {
        matches!(locator.location(), RepoLocation::Local { .. })
    }

    async fn fetch(&self, locator: &RepoLocator, config: &Config) -> Result<FetchedContent> {
        let RepoLocation::Local { path } = locator.location() else {
            return Err(AnalyzerError::InvalidInput(format!("{} is not a local path", locator)));
        };

        if !tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Err(AnalyzerError::Fetch(format!(
                "{} does not exist or is not a directory",
                path.display()
            )));
        }

        collect_local(path.clone(), config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_directory_is_fetch_error() {
        let dir = TempDir::new().unwrap();
        let url = url::Url::from_directory_path(dir.path().join("gone")).unwrap();
        let locator = RepoLocator::parse(url.as_str()).unwrap();

        let err = LocalFetcher::new().fetch(&locator, &Config::default()).await.unwrap_err();
        assert_eq!(err.kind(), "FetchError");
    }

    #[tokio::test]
    async fn test_reads_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        let url = url::Url::from_directory_path(dir.path()).unwrap();
        let locator = RepoLocator::parse(url.as_str()).unwrap();

        let content = LocalFetcher::new().fetch(&locator, &Config::default()).await.unwrap();
        assert_eq!(content.files.len(), 1);
        assert_eq!(content.files[0].path, "main.py");
    }
}
