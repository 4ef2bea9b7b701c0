// Analysis Pipeline
// segment -> truncate -> score (bounded concurrency) -> aggregate

use crate::error::DetectError;
use crate::models::{AnalysisResult, ScoreOutcome, Sentence};
use crate::services::config_store::{AppConfig, DetectionConfig};
use crate::services::sentence_segmenter::segment;
use crate::services::truncator::truncate;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::aggregation::aggregate;
use super::cache::{ClassifierCache, ClassifierLoader};
use super::classifier::ClassifierHandle;
use super::remote::BackendLoader;

/// Analyze `text` with an already constructed classifier.
///
/// Idempotent: no state outside the handle is touched. Per-sentence inference
/// failures become unscored sentences; only configuration errors and
/// cancellation fail the call.
pub async fn analyze(
    text: &str,
    config: &DetectionConfig,
    handle: &ClassifierHandle,
    cancel: &CancellationToken,
) -> Result<AnalysisResult, DetectError> {
    config.validate()?;
    let started = Instant::now();

    let sentences = segment(text);
    let truncation = truncate(&sentences, config.max_tokens)?;
    let analyzed_len = truncation.analyzed_len();
    let was_truncated = truncation.was_truncated;

    let outcomes = score_sentences(truncation.kept, handle, config.max_concurrency, cancel).await?;
    let result = aggregate(text, analyzed_len, was_truncated, outcomes, config.threshold);

    info!(
        model = handle.name(),
        sentences = sentences.len(),
        analyzed = result.sentences.len(),
        unscored = result.unscored_count,
        truncated = result.truncated,
        originality = ?result.originality_percentage,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "analysis.complete"
    );
    Ok(result)
}

async fn score_sentences(
    sentences: Vec<Sentence>,
    handle: &ClassifierHandle,
    max_concurrency: usize,
    cancel: &CancellationToken,
) -> Result<Vec<(Sentence, ScoreOutcome)>, DetectError> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks: JoinSet<(usize, Result<f64, DetectError>)> = JoinSet::new();

    for (slot, sentence) in sentences.iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let handle = handle.clone();
        let cancel = cancel.clone();
        let text = sentence.text.clone();
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(p) => p,
                Err(_) => return (slot, Err(DetectError::Cancelled)),
            };
            (slot, handle.score(&text, &cancel).await)
        });
    }

    let mut scores: Vec<Option<ScoreOutcome>> = vec![None; sentences.len()];
    while let Some(joined) = tasks.join_next().await {
        let (slot, result) = match joined {
            Ok(v) => v,
            Err(e) => {
                // A panicking backend only loses its own sentence, but we cannot tell which one.
                warn!(error = %e, "analysis.score_task_failed");
                continue;
            }
        };
        match result {
            Ok(p) => scores[slot] = Some(ScoreOutcome::Scored(p)),
            Err(DetectError::Cancelled) => {
                tasks.abort_all();
                return Err(DetectError::Cancelled);
            }
            Err(e) => {
                warn!(sentence = slot, error = %e, "analysis.sentence_unscored");
                scores[slot] = Some(ScoreOutcome::Failed(e.to_string()));
            }
        }
    }

    Ok(sentences
        .into_iter()
        .zip(scores)
        .map(|(sentence, outcome)| {
            let outcome = outcome.unwrap_or_else(|| ScoreOutcome::Failed("scoring task aborted".to_string()));
            (sentence, outcome)
        })
        .collect())
}

/// Composition root for front ends: owns the classifier cache and the configuration.
pub struct Detector {
    cache: ClassifierCache,
    config: AppConfig,
}

impl Detector {
    pub fn new(config: AppConfig) -> Self {
        Self::with_loader(config, Arc::new(BackendLoader))
    }

    pub fn with_loader(config: AppConfig, loader: Arc<dyn ClassifierLoader>) -> Self {
        Self {
            cache: ClassifierCache::new(loader),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &ClassifierCache {
        &self.cache
    }

    /// Validate configuration, obtain the memoized classifier, then analyze.
    pub async fn analyze(&self, text: &str, cancel: &CancellationToken) -> Result<AnalysisResult, DetectError> {
        self.config.detection.validate()?;
        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DetectError::Cancelled),
            handle = self.cache.get_classifier(&self.config.classifier) => handle?,
        };
        analyze(text, &self.config.detection, &handle, cancel).await
    }
}
