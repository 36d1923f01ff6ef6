use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Repository to analyse
    pub repo_url: String,
}

/// One file pulled from a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedFile {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// File text, cut to the configured per-file cap
    pub content: String,
    /// Whether `content` was cut
    pub truncated: bool,
}

/// Coarse facts about a repository, taken from its full file listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryProfile {
    /// `rust`, `nodejs`, `python`, `go`, `java` or `unknown`
    pub project_type: String,
    /// A README exists at the repository root
    pub readme_present: bool,
    /// Test files or test directories exist anywhere
    pub tests_present: bool,
    /// Number of candidate files before ranking and capping
    pub files_considered: usize,
}

/// Files selected for the prompt, highest priority first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedContent {
    pub files: Vec<FetchedFile>,
    pub profile: RepositoryProfile,
}

/// Summary and suggestions extracted from a completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub summary: String,
    pub improvements: Vec<String>,
}

/// Static health facts returned alongside the suggestions when enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub project_type: String,
    pub readme_present: bool,
    pub tests_present: bool,
    /// Files the fetcher selected
    pub files_fetched: usize,
    /// Files that made it into the prompt
    pub files_analyzed: usize,
}

/// Response body of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub repo_url: String,
    pub summary: String,
    pub improvements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_report: Option<HealthReport>,
}

impl FetchedContent {
    /// Total characters of file content
    pub fn total_chars(&self) -> usize {
        self.files.iter().map(|f| f.content.chars().count()).sum()
    }
}

impl HealthReport {
    /// Builds the report from what the fetcher saw and how many files the
    /// prompt kept
    pub fn from_content(content: &FetchedContent, files_in_prompt: usize) -> Self {
        Self {
            project_type: content.profile.project_type.clone(),
            readme_present: content.profile.readme_present,
            tests_present: content.profile.tests_present,
            files_fetched: content.files.len(),
            files_analyzed: files_in_prompt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_wire_shape_without_health() {
        let result = AnalysisResult {
            repo_url: "https://github.com/a/b".into(),
            summary: "fine".into(),
            improvements: vec!["add tests".into()],
            health_report: None,
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"repo_url": "https://github.com/a/b", "summary": "fine", "improvements": ["add tests"]})
        );
    }

    #[test]
    fn test_health_report_separates_fetched_from_analyzed() {
        let content = FetchedContent {
            files: vec![
                FetchedFile { path: "README.md".into(), content: "# A".into(), truncated: false },
                FetchedFile { path: "src/lib.rs".into(), content: "".into(), truncated: false },
            ],
            profile: RepositoryProfile {
                project_type: "rust".into(),
                readme_present: true,
                tests_present: false,
                files_considered: 7,
            },
        };
        let report = HealthReport::from_content(&content, 1);
        assert_eq!(report.files_fetched, 2);
        assert_eq!(report.files_analyzed, 1);
        assert_eq!(serde_json::to_value(&report).unwrap()["files_analyzed"], json!(1));
    }

    #[test]
    fn test_request_requires_repo_url() {
        assert!(serde_json::from_str::<AnalysisRequest>("{}").is_err());
        let req: AnalysisRequest = serde_json::from_str(r#"{"repo_url":"x"}"#).unwrap();
        assert_eq!(req.repo_url, "x");
    }
}
