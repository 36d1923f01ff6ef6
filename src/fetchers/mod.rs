use crate::config::{Config, IngestStrategy};
use crate::error::{AnalyzerError, Result};
use crate::types::FetchedContent;
use async_trait::async_trait;
use tracing::info;

/// Ranking and reading shared by all strategies
pub mod common;
/// Zipball download and extraction
pub mod archive;
/// Shallow `git clone`
pub mod clone;
/// GitHub REST API ingestion
pub mod github;
/// `file://` checkouts
pub mod local;
/// URL validation and normalisation
pub mod locator;

pub use locator::{RepoLocation, RepoLocator};

/// Interface for repository fetchers
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Returns the name of the fetcher
    fn name(&self) -> &'static str;
    /// Determines if this fetcher can handle the given repository
    fn accepts(&self, locator: &RepoLocator) -> bool;
    /// Retrieves the ranked, size-capped file set for the repository
    async fn fetch(&self, locator: &RepoLocator, config: &Config) -> Result<FetchedContent>;
}

/// Factory for creating repository fetchers
pub struct FetcherFactory;

impl FetcherFactory {
    /// Creates the fetcher for `locator` under the configured strategy.
    ///
    /// `file://` URLs read from disk only when `ingest.allow_local_paths` is
    /// set. GitHub-only strategies fall back to cloning for other hosts.
    pub fn create_fetcher(locator: &RepoLocator, config: &Config) -> Result<Box<dyn RepositoryFetcher>> {
        let local = local::LocalFetcher::new();
        if local.accepts(locator) {
            if !config.ingest.allow_local_paths {
                return Err(AnalyzerError::InvalidInput(
                    "file:// repository URLs are not accepted by this service".into(),
                ));
            }
            return Ok(Box::new(local));
        }

        let fetcher: Box<dyn RepositoryFetcher> = match config.ingest.strategy {
            IngestStrategy::Api => Box::new(github::GitHubApiFetcher::new(config)?),
            IngestStrategy::Archive => Box::new(archive::ArchiveFetcher::new(config)?),
            IngestStrategy::Clone => Box::new(clone::CloneFetcher::new(config)),
        };

        if fetcher.accepts(locator) {
            Ok(fetcher)
        } else {
            info!(
                "{} strategy cannot read {}; falling back to git clone",
                config.ingest.strategy, locator
            );
            Ok(Box::new(clone::CloneFetcher::new(config)))
        }
    }
}

/// Validated fetch: picks the fetcher and runs it
pub async fn fetch_repository(locator: &RepoLocator, config: &Config) -> Result<FetchedContent> {
    let fetcher = FetcherFactory::create_fetcher(locator, config)?;
    info!("Fetching {} with {}", locator, fetcher.name());
    fetcher.fetch(locator, config).await
}
