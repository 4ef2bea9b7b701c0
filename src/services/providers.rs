// Inference Provider Service
// HTTP client for hosted text-classification models (Hugging Face inference API shape)

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing label '{0}' in response")]
    MissingLabel(String),
    #[error("JSON parse error: {0}")]
    JsonError(String),
}

#[derive(Debug, Clone, Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    parameters: ClassifyParameters,
    options: ClassifyOptions,
}

#[derive(Debug, Clone, Serialize)]
struct ClassifyParameters {
    truncation: bool,
    max_length: i32,
}

#[derive(Debug, Clone, Serialize)]
struct ClassifyOptions {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// The endpoint answers `[{..}]` for one input or `[[{..}]]` when it batches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ClassifyResult {
    pub labels: Vec<LabelScore>,
    pub latency_ms: i64,
}

pub struct InferenceClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    max_length: i32,
}

impl InferenceClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
        max_length: i32,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: model_url(endpoint, model),
            api_key,
            max_length,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn classify(&self, text: &str) -> Result<ClassifyResult, ProviderError> {
        let start = Instant::now();
        let body = ClassifyRequest {
            inputs: text,
            parameters: ClassifyParameters {
                truncation: true,
                max_length: self.max_length,
            },
            options: ClassifyOptions {
                wait_for_model: true,
                use_cache: true,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|b| b.error)
                .unwrap_or(raw);
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let labels = parse_labels(&raw)?;
        Ok(ClassifyResult {
            labels,
            latency_ms: start.elapsed().as_millis() as i64,
        })
    }
}

fn model_url(endpoint: &str, model: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), model.trim().trim_start_matches('/'))
}

pub fn parse_labels(raw: &str) -> Result<Vec<LabelScore>, ProviderError> {
    let parsed: ClassifyResponse =
        serde_json::from_str(raw).map_err(|e| ProviderError::JsonError(e.to_string()))?;
    let labels = match parsed {
        ClassifyResponse::Nested(mut rows) => {
            if rows.is_empty() {
                Vec::new()
            } else {
                rows.swap_remove(0)
            }
        }
        ClassifyResponse::Flat(labels) => labels,
    };
    if labels.is_empty() {
        return Err(ProviderError::JsonError("empty label list".to_string()));
    }
    Ok(labels)
}

/// Probability of the AI class. Falls back to `1 - score` of the best other label
/// when a binary model only reports its top class.
pub fn ai_probability(labels: &[LabelScore], ai_label: &str) -> Result<f64, ProviderError> {
    if let Some(hit) = labels.iter().find(|l| l.label.eq_ignore_ascii_case(ai_label)) {
        return Ok(hit.score);
    }
    if labels.len() == 1 {
        return Ok(1.0 - labels[0].score);
    }
    Err(ProviderError::MissingLabel(ai_label.to_string()))
}
