// Originality Core Services

pub mod text_processor;
pub mod config_store;
pub mod providers;
pub mod detection;
pub mod sentence_segmenter;
pub mod truncator;
pub mod report;
pub mod document;

pub use text_processor::*;
pub use config_store::*;
pub use sentence_segmenter::*;
pub use truncator::*;
pub use document::{extract_docx_text, read_docx_file, ExtractError};

// Re-export detection and report entry points
pub use detection::{
    aggregate,
    analyze,
    BackendLoader,
    Classifier,
    ClassifierCache,
    ClassifierHandle,
    ClassifierLoader,
    Detector,
    StylometryClassifier,
    DEFAULT_THRESHOLD,
};
pub use report::{render, render_to_writer, OutputFormat, PageGeometry, RenderedReport};
