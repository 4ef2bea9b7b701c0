// Classifier abstraction
// A loaded model scores one sentence at a time; the handle adds cancellation and output checks.

use crate::error::DetectError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Anything that maps a sentence to the probability that it was machine-generated.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Probability in `[0, 1]` that `text` is AI-generated.
    async fn score(&self, text: &str) -> Result<f64, DetectError>;

    /// Model name for diagnostics.
    fn name(&self) -> &str;
}

/// Shared, read-only reference to a constructed classifier.
#[derive(Clone)]
pub struct ClassifierHandle {
    inner: Arc<dyn Classifier>,
    key: Arc<str>,
}

impl ClassifierHandle {
    pub fn new(classifier: Arc<dyn Classifier>, key: impl Into<Arc<str>>) -> Self {
        Self {
            inner: classifier,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// True when both handles point at the same constructed model.
    pub fn same_instance(&self, other: &ClassifierHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Score one sentence, returning `Cancelled` as soon as `cancel` fires.
    pub async fn score(&self, text: &str, cancel: &CancellationToken) -> Result<f64, DetectError> {
        if cancel.is_cancelled() {
            return Err(DetectError::Cancelled);
        }
        let probability = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DetectError::Cancelled),
            result = self.inner.score(text) => result?,
        };
        validate_probability(probability)
    }
}

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("key", &self.key)
            .field("name", &self.inner.name())
            .finish()
    }
}

fn validate_probability(p: f64) -> Result<f64, DetectError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(DetectError::Inference(format!(
            "classifier returned out-of-range probability {}",
            p
        )))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Fixed probabilities per sentence text; unknown text scores `fallback`.
    pub struct StubClassifier {
        pub scores: HashMap<String, f64>,
        pub failing: Vec<String>,
        pub fallback: f64,
        pub delay: Option<Duration>,
    }

    impl StubClassifier {
        pub fn new(pairs: &[(&str, f64)]) -> Self {
            Self {
                scores: pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
                failing: Vec::new(),
                fallback: 0.5,
                delay: None,
            }
        }

        pub fn failing_on(mut self, text: &str) -> Self {
            self.failing.push(text.to_string());
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn into_handle(self) -> ClassifierHandle {
            ClassifierHandle::new(Arc::new(self), "stub")
        }
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn score(&self, text: &str) -> Result<f64, DetectError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.iter().any(|f| f == text) {
                return Err(DetectError::Inference(format!("stub refuses '{}'", text)));
            }
            Ok(self.scores.get(text).copied().unwrap_or(self.fallback))
        }

        fn name(&self) -> &str {
            "stub"
        }
    }
}
