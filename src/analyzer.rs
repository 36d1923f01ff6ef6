use crate::config::Config;
use crate::error::Result;
use crate::fetchers::{fetch_repository, RepoLocator};
use crate::ollama::CompletionModel;
use crate::parser::parse_or_fallback;
use crate::prompt_builder::PromptBuilder;
use crate::types::{AnalysisRequest, AnalysisResult, HealthReport};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runs fetch, prompt, completion and parsing for one repository
#[derive(Clone)]
pub struct Analyzer {
    config: Arc<Config>,
    model: Arc<dyn CompletionModel>,
}

impl Analyzer {
    pub fn new(config: Arc<Config>, model: Arc<dyn CompletionModel>) -> Self {
        Self { config, model }
    }

    pub fn model(&self) -> &Arc<dyn CompletionModel> {
        &self.model
    }

    /// Analyses `request.repo_url`.
    ///
    /// Fails on a bad URL, an unreachable repository or model. A completion
    /// that cannot be parsed is returned as the summary.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let started = Instant::now();
        let locator = RepoLocator::parse(&request.repo_url)?;

        let content = fetch_repository(&locator, &self.config).await?;
        info!(
            "Selected {} of {} candidate files ({} chars)",
            content.files.len(),
            content.profile.files_considered,
            content.total_chars()
        );

        let prompt = PromptBuilder::new(self.config.max_prompt_chars).render(locator.as_str(), &content);
        let completion = self.model.complete(&prompt.text).await?;
        let suggestions = parse_or_fallback(&completion);

        let health_report = self
            .config
            .report_health
            .then(|| HealthReport::from_content(&content, prompt.files_included));

        info!(
            "Analysis finished with {} improvements in {:.1}s",
            suggestions.improvements.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(AnalysisResult {
            repo_url: locator.to_string(),
            summary: suggestions.summary,
            improvements: suggestions.improvements,
            health_report,
        })
    }
}
