// Report Rendering
// Turns an immutable AnalysisResult into console text, a paginated PDF or JSON.
//
// Rendering never touches the classifier, so a stored result can be rendered
// again in any format. Same result + same format + same geometry gives
// byte-identical output.

pub mod layout;
pub mod pdf;
pub mod text;

use crate::error::DetectError;
use crate::models::{AnalysisResult, DocumentLabel};
use serde::{Deserialize, Serialize};
use std::io::Write;

pub use layout::{paginate, LayoutLine, LineKind, Page, ReportLayout};

/// Largest accepted geometry; keeps the document page inside PDF size limits.
pub const MAX_WIDTH_CHARS: usize = 2000;
pub const MAX_LINES_PER_PAGE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Console summary with per-sentence verdicts.
    #[default]
    Text,
    /// Paginated, highlighted PDF.
    Document,
    /// The report model itself, pretty-printed.
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "document" | "doc" | "pdf" => Some(Self::Document),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Document => "document",
            Self::Json => "json",
        }
    }

    /// Conventional file extension for an output file in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Document => "pdf",
            Self::Json => "json",
        }
    }
}

/// Fixed page size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width_chars: usize,
    pub lines_per_page: usize,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width_chars: 90,
            lines_per_page: 50,
        }
    }
}

impl PageGeometry {
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.width_chars == 0 || self.lines_per_page == 0 {
            return Err(DetectError::Render(format!(
                "degenerate page geometry {}x{}",
                self.width_chars, self.lines_per_page
            )));
        }
        if self.width_chars > MAX_WIDTH_CHARS || self.lines_per_page > MAX_LINES_PER_PAGE {
            return Err(DetectError::Render(format!(
                "page geometry {}x{} exceeds {}x{}",
                self.width_chars, self.lines_per_page, MAX_WIDTH_CHARS, MAX_LINES_PER_PAGE
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedReport {
    Text(String),
    Document(Vec<u8>),
}

impl RenderedReport {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Document(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(s) => s.into_bytes(),
            Self::Document(b) => b,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Document(_))
    }
}

/// Render `result` in `format`. `geometry` only affects the paginated document.
pub fn render(
    result: &AnalysisResult,
    format: OutputFormat,
    geometry: &PageGeometry,
) -> Result<RenderedReport, DetectError> {
    match format {
        OutputFormat::Text => Ok(RenderedReport::Text(text::render_text(result))),
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map(RenderedReport::Text)
            .map_err(|e| DetectError::Render(format!("serialize report: {}", e))),
        OutputFormat::Document => {
            let layout = paginate(result, geometry)?;
            Ok(RenderedReport::Document(pdf::render_pdf(&layout, geometry)))
        }
    }
}

/// Render and write to `sink`; sink failures surface as `Render`.
pub fn render_to_writer<W: Write>(
    result: &AnalysisResult,
    format: OutputFormat,
    geometry: &PageGeometry,
    mut sink: W,
) -> Result<(), DetectError> {
    let rendered = render(result, format, geometry)?;
    sink.write_all(rendered.as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// Summary block shared by the console text and the paginated document.
pub(crate) fn summary_lines(result: &AnalysisResult) -> Vec<(LineKind, String)> {
    let mut lines = vec![(LineKind::Title, "Originality Report".to_string())];

    let verdict = match (&result.document, result.undetermined) {
        (_, true) | (None, _) => "Result: Undetermined (no sentence could be scored)".to_string(),
        (Some(doc), false) => match doc.label {
            DocumentLabel::LikelyAi => "Result: Likely AI-generated".to_string(),
            DocumentLabel::LikelyHuman => "Result: Likely human-written".to_string(),
        },
    };
    lines.push((LineKind::Summary, verdict));

    let originality = match result.originality_percentage {
        Some(p) => format!("Originality: {:.2}% human-written", p),
        None => "Originality: undetermined".to_string(),
    };
    lines.push((LineKind::Summary, originality));

    if let Some(doc) = &result.document {
        lines.push((
            LineKind::Summary,
            format!(
                "AI confidence: {:.2}% ({})",
                doc.mean_ai_probability * 100.0,
                doc.source_hint
            ),
        ));
    }

    lines.push((
        LineKind::Summary,
        format!(
            "Sentences: {} scored ({} human, {} AI), {} unscored",
            result.scored_count, result.human_count, result.ai_count, result.unscored_count
        ),
    ));

    if result.truncated {
        lines.push((
            LineKind::Summary,
            format!(
                "Note: input exceeded the token budget; only the first {} of {} characters were analyzed.",
                result.analyzed_text().chars().count(),
                result.original_text.chars().count()
            ),
        ));
    }
    lines
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{AnalysisResult, ScoreOutcome};
    use crate::services::detection::aggregation::aggregate;
    use crate::services::sentence_segmenter::segment;

    /// Score sentences of `text` in order; `None` marks an inference failure.
    pub fn result_for(text: &str, scores: &[Option<f64>]) -> AnalysisResult {
        let outcomes = segment(text)
            .into_iter()
            .zip(scores.iter().chain(std::iter::repeat(&Some(0.1))))
            .map(|(s, p)| match p {
                Some(p) => (s, ScoreOutcome::Scored(*p)),
                None => (s, ScoreOutcome::Failed("stub failure".to_string())),
            })
            .collect();
        aggregate(text, text.len(), false, outcomes, 0.5)
    }
}
