use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::fetchers::common::{collect_local, IGNORED_DIRS};
use crate::fetchers::github::{api_url, create_github_client, status_error};
use crate::fetchers::locator::RepoLocator;
use crate::fetchers::RepositoryFetcher;
use crate::types::FetchedContent;
use async_trait::async_trait;
use reqwest::Client;
use std::fs as std_fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Downloads the repository zipball and reads it from a temporary directory
pub struct ArchiveFetcher {
    client: Client,
    api_base: String,
    max_bytes: u64,
}

impl ArchiveFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: create_github_client(config)?,
            api_base: config.ingest.github_api_base.clone(),
            max_bytes: config.ingest.max_archive_bytes,
        })
    }

    async fn download_archive(&self, owner: &str, repo: &str) -> Result<Vec<u8>> {
        let url = api_url(&self.api_base, &["repos", owner, repo, "zipball"])?;
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnalyzerError::Fetch(format!("Failed to download archive: {}", e)))?;

        if !response.status().is_success() {
            return Err(status_error(response.status(), &format!("archive of {}/{}", owner, repo)));
        }

        let too_large = || {
            AnalyzerError::Fetch(format!(
                "archive of {}/{} exceeds the {} byte limit",
                owner, repo, self.max_bytes
            ))
        };
        if response.content_length().map_or(false, |len| len > self.max_bytes) {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AnalyzerError::Fetch(format!("Failed to read archive: {}", e)))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Unpacks a zip archive, refusing entries that would escape `extract_path`
/// and skipping anything under a vendored or build directory
pub async fn extract_archive(archive_bytes: Vec<u8>, extract_path: &Path) -> Result<()> {
    let path = extract_path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        std_fs::create_dir_all(&path)?;
        let reader = std::io::Cursor::new(archive_bytes);
        let mut archive = zip::ZipArchive::new(reader)?;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let outpath = match file.enclosed_name() {
                Some(name) if is_ignored(name) => {
                    debug!("Not extracting {}", name.display());
                    continue;
                }
                Some(name) => path.join(name),
                None => continue,
            };

            if file.is_dir() {
                std_fs::create_dir_all(&outpath)?;
            } else {
                if let Some(parent) = outpath.parent() {
                    std_fs::create_dir_all(parent)?;
                }
                let mut outfile = std_fs::File::create(&outpath)?;
                std::io::copy(&mut file, &mut outfile)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| AnalyzerError::Internal(format!("Join error: {}", e)))?
}

fn is_ignored(name: &Path) -> bool {
    name.components()
        .any(|c| IGNORED_DIRS.contains(&&*c.as_os_str().to_string_lossy()))
}

/// GitHub zipballs wrap everything in a single `<owner>-<repo>-<sha>/`
/// directory; returns it when present, else the extraction root.
pub fn find_main_repository_dir(extract_path: &Path) -> Result<PathBuf> {
    let entries: Vec<PathBuf> = std_fs::read_dir(extract_path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Ok(extract_path.to_path_buf()),
    }
}

#[async_trait]
impl RepositoryFetcher for ArchiveFetcher {
    fn name(&self) -> &'static str {
        "github-archive"
    }

    fn accepts(&self, locator: &RepoLocator) -> bool {
        locator.github_slug().is_some()
    }

    async fn fetch(&self, locator: &RepoLocator, config: &Config) -> Result<FetchedContent> {
        let (owner, repo) = locator.github_slug().ok_or_else(|| {
            AnalyzerError::InvalidInput(format!("{} is not a GitHub repository", locator))
        })?;

        let bytes = self.download_archive(owner, repo).await?;
        info!("Downloaded {} byte archive for {}/{}", bytes.len(), owner, repo);

        let temp_dir = TempDir::new()?;
        extract_archive(bytes, temp_dir.path()).await?;
        let root = find_main_repository_dir(temp_dir.path())?;

        collect_local(root, config).await
    }
}
