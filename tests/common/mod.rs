#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use repo_analyzer::config::{Config, IngestStrategy};
use repo_analyzer::{CompletionModel, Result};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

pub mod test_helpers {
    use super::*;

    /// Config whose GitHub API calls go to `api_base`
    pub fn github_config(api_base: &str) -> Config {
        let mut config = Config::default();
        config.ingest.strategy = IngestStrategy::Api;
        config.ingest.github_api_base = api_base.trim_end_matches('/').to_string();
        config
    }

    /// Config whose model calls go to `host`, reading `file://` repositories
    pub fn ollama_config(host: &str) -> Config {
        let mut config = Config::default();
        config.ollama.host = host.trim_end_matches('/').to_string();
        config.ollama.model = "codellama".into();
        config.ingest.allow_local_paths = true;
        config
    }

    /// Default config that can read `file://` repositories
    pub fn local_config() -> Config {
        let mut config = Config::default();
        config.ingest.allow_local_paths = true;
        config
    }

    /// GitHub contents API body for `text`, wrapped like the real API does
    pub fn contents_body(text: &str) -> String {
        let encoded = STANDARD.encode(text);
        let wrapped = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::json!({"content": wrapped, "encoding": "base64"}).to_string()
    }

    pub fn setup_test_logger() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("repo_analyzer=debug")
            .with_test_writer()
            .try_init();
    }
}

/// A repository on disk reachable through a `file://` URL
pub struct TempRepo {
    dir: TempDir,
}

impl TempRepo {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(full, content).unwrap();
        }
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn url(&self) -> String {
        url::Url::from_directory_path(self.dir.path()).unwrap().to_string()
    }
}

/// Model that always answers with the same text and records its prompts
pub struct ScriptedModel {
    reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
