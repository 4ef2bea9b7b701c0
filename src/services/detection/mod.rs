// Detection Module
// AI text detection core logic organized into specialized submodules:
// - classifier: Classifier trait and the cancellable handle shared by callers
// - cache: Single-flight memoization of constructed classifiers
// - local_model: Offline stylometry classifier
// - remote: Hosted inference classifier and the production loader
// - aggregation: Verdicts, originality percentage and document verdict
// - pipeline: End-to-end analysis and the Detector composition root

pub mod classifier;
pub mod cache;
pub mod local_model;
pub mod remote;
pub mod aggregation;
pub mod pipeline;

pub use classifier::{Classifier, ClassifierHandle};
pub use cache::{ClassifierCache, ClassifierLoader};
pub use local_model::StylometryClassifier;
pub use remote::{BackendLoader, RemoteClassifier};
pub use aggregation::{aggregate, originality_percentage, source_hint, DEFAULT_THRESHOLD};
pub use pipeline::{analyze, Detector};
