// Remote Classifier
// Scores sentences against a hosted text-classification model.

use crate::error::DetectError;
use crate::services::config_store::{ClassifierBackend, ClassifierConfig};
use crate::services::providers::{ai_probability, InferenceClient};
use crate::services::truncator::count_tokens;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::cache::ClassifierLoader;
use super::classifier::Classifier;
use super::local_model::StylometryClassifier;

const WARMUP_TEXT: &str = "This is a short warm-up sentence.";

pub struct RemoteClassifier {
    client: InferenceClient,
    model: String,
    ai_label: String,
    max_input_tokens: i32,
}

impl RemoteClassifier {
    /// Build the client and run one warm-up request so an unreachable or
    /// incompatible model fails here rather than on the first sentence.
    pub async fn connect(config: &ClassifierConfig) -> Result<Self, DetectError> {
        let client = InferenceClient::new(
            config.endpoint_or_default(),
            &config.model,
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
            config.max_input_tokens,
        )
        .map_err(|e| DetectError::ModelUnavailable(e.to_string()))?;

        let warmup = client
            .classify(WARMUP_TEXT)
            .await
            .map_err(|e| DetectError::ModelUnavailable(format!("{}: {}", client.url(), e)))?;
        ai_probability(&warmup.labels, &config.ai_label)
            .map_err(|e| DetectError::ModelUnavailable(format!("incompatible model output: {}", e)))?;

        info!(
            url = client.url(),
            latency_ms = warmup.latency_ms,
            labels = ?warmup.labels.iter().map(|l| l.label.as_str()).collect::<Vec<_>>(),
            "classifier.remote.connected"
        );

        Ok(Self {
            client,
            model: config.model.clone(),
            ai_label: config.ai_label.clone(),
            max_input_tokens: config.max_input_tokens,
        })
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn score(&self, text: &str) -> Result<f64, DetectError> {
        let tokens = count_tokens(text);
        if self.max_input_tokens > 0 && tokens > self.max_input_tokens as usize {
            return Err(DetectError::Inference(format!(
                "sentence has {} tokens, classifier limit is {}",
                tokens, self.max_input_tokens
            )));
        }

        let result = self
            .client
            .classify(text)
            .await
            .map_err(|e| DetectError::Inference(e.to_string()))?;
        debug!(latency_ms = result.latency_ms, "classifier.remote.scored");

        ai_probability(&result.labels, &self.ai_label).map_err(|e| DetectError::Inference(e.to_string()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Production loader: picks the backend named in the configuration.
pub struct BackendLoader;

#[async_trait]
impl ClassifierLoader for BackendLoader {
    async fn load(&self, config: &ClassifierConfig) -> Result<Arc<dyn Classifier>, DetectError> {
        match config.backend {
            ClassifierBackend::Huggingface => Ok(Arc::new(RemoteClassifier::connect(config).await?)),
            ClassifierBackend::Stylometry => Ok(Arc::new(StylometryClassifier::new())),
        }
    }
}
