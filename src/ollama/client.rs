use super::types::*;
use super::CompletionModel;
use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::utils::with_retry;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("repo-analyzer/", env!("CARGO_PKG_VERSION"));
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Client for a local or remote Ollama server
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
    max_tokens: u32,
    temperature: f32,
    retries: u32,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ollama.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AnalyzerError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.ollama.host.trim_end_matches('/').to_string(),
            model: config.ollama.model.clone(),
            timeout_secs: config.ollama.timeout_secs,
            max_tokens: config.ollama.max_tokens,
            temperature: config.ollama.temperature,
            retries: config.model_retries(),
        })
    }

    /// One `POST /api/generate` round trip, no retry
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_tokens,
                temperature: self.temperature,
            },
        };

        debug!("Sending {} prompt chars to {}", prompt.chars().count(), self.model);
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        let body: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::ModelTimeout(self.timeout_secs)
            } else {
                AnalyzerError::ModelUnavailable(format!("invalid response from Ollama: {}", e))
            }
        })?;

        if !body.done {
            warn!("Ollama reported an unfinished generation");
        }
        Ok(body.response)
    }

    /// Names of the models installed on the server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = self.check_status(response).await?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::ModelUnavailable(format!("invalid model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn transport_error(&self, e: reqwest::Error) -> AnalyzerError {
        if e.is_timeout() {
            AnalyzerError::ModelTimeout(self.timeout_secs)
        } else {
            AnalyzerError::ModelUnavailable(format!("cannot reach Ollama at {}: {}", self.base_url, e))
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(AnalyzerError::ModelUnavailable(format!(
            "Ollama returned HTTP {}: {}",
            status,
            detail.trim()
        )))
    }
}

/// Installed names carry a tag suffix, `codellama` matches `codellama:latest`
fn model_installed(installed: &[String], model: &str) -> bool {
    installed
        .iter()
        .any(|name| name == model || name.split_once(':').map(|(base, _)| base) == Some(model))
}

#[async_trait]
impl CompletionModel for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        info!("Requesting completion from {}", self.model);
        with_retry(
            || self.generate(prompt),
            self.retries,
            RETRY_DELAY,
            AnalyzerError::is_transient,
        )
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(models) => model_installed(&models, &self.model),
            Err(e) => {
                debug!("Model health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config_for(host: &str) -> Config {
        let mut config = Config::default();
        config.ollama.host = host.to_string();
        config.ollama.model = "codellama".into();
        config
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(json!({
                "model": "codellama",
                "prompt": "hello",
                "stream": false,
                "options": {"num_predict": 1024}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"model":"codellama","response":"SUMMARY: ok","done":true}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(&config_for(&server.url())).unwrap();
        let text = client.complete("hello").await.unwrap();

        assert_eq!(text, "SUMMARY: ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_model_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body(r#"{"error":"model 'codellama' not found, try pulling it first"}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(&config_for(&server.url())).unwrap();
        let err = client.complete("hello").await.unwrap_err();

        assert_eq!(err.kind(), "ModelUnavailableError");
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body("<html>proxy error</html>")
            .create_async()
            .await;

        let client = OllamaClient::new(&config_for(&server.url())).unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert_eq!(err.kind(), "ModelUnavailableError");
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let client = OllamaClient::new(&config_for("http://127.0.0.1:1")).unwrap();
        let err = client.complete("hello").await.unwrap_err();
        assert_eq!(err.kind(), "ModelUnavailableError");
    }

    #[tokio::test]
    async fn test_retries_once_on_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let mut config = config_for(&server.url());
        config.ollama.retries = 5;
        let client = OllamaClient::new(&config).unwrap();

        assert!(client.complete("hello").await.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "late", "done": true}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config_for(&server.uri());
        config.ollama.timeout_secs = 1;
        let client = OllamaClient::new(&config).unwrap();

        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, AnalyzerError::ModelTimeout(1)));
    }

    #[tokio::test]
    async fn test_availability_from_tags() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models":[{"name":"codellama:latest"},{"name":"llama3:8b"}]}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(&config_for(&server.url())).unwrap();
        assert_eq!(client.list_models().await.unwrap(), vec!["codellama:latest", "llama3:8b"]);
        assert!(client.is_available().await);

        let mut other = config_for(&server.url());
        other.ollama.model = "mistral".into();
        assert!(!OllamaClient::new(&other).unwrap().is_available().await);
    }

    #[test]
    fn test_model_installed() {
        let installed = vec!["codellama:7b".to_string(), "llama3".to_string()];
        assert!(model_installed(&installed, "codellama"));
        assert!(model_installed(&installed, "codellama:7b"));
        assert!(model_installed(&installed, "llama3"));
        assert!(!model_installed(&installed, "code"));
    }
}
