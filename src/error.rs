// Error taxonomy shared by the analysis pipeline and the report renderer.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    /// Invalid budget, threshold or geometry-independent setting; raised before any inference.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The classifier could not be constructed. Fatal for the request, retryable later.
    #[error("classifier unavailable: {0}")]
    ModelUnavailable(String),
    /// Scoring a single sentence failed.
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("render failed: {0}")]
    Render(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl DetectError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DetectError::Cancelled)
    }
}

impl From<std::io::Error> for DetectError {
    fn from(err: std::io::Error) -> Self {
        DetectError::Render(err.to_string())
    }
}
