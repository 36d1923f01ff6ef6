use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerateOptions {
    pub num_predict: u32,
    pub temperature: f32,
}

/// Non-streaming reply of `POST /api/generate`
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Reply of `GET /api/tags`
#[derive(Debug, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

/// Error body Ollama sends with non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
