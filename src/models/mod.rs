// Originality Data Models
// Sentences, scores and the immutable analysis report

use serde::{Deserialize, Serialize};
use std::ops::Range;

// ============ Sentences ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub index: usize,
    /// Trimmed sentence text; always equal to `source[start_offset..end_offset]`.
    pub text: String,
    /// UTF-8 byte offset (0-based) into the original input.
    pub start_offset: usize,
    /// UTF-8 byte offset (0-based, end-exclusive) into the original input.
    pub end_offset: usize,
}

impl Sentence {
    pub fn span(&self) -> Range<usize> {
        self.start_offset..self.end_offset
    }
}

// ============ Scoring ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Human,
    Ai,
    /// Inference failed; excluded from every ratio.
    Unscored,
}

impl Verdict {
    /// `ai_probability >= threshold` is AI; the boundary itself is AI.
    pub fn from_probability(ai_probability: f64, threshold: f64) -> Self {
        if ai_probability >= threshold {
            Verdict::Ai
        } else {
            Verdict::Human
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Human => "HUMAN",
            Verdict::Ai => "AI",
            Verdict::Unscored => "UNSCORED",
        }
    }
}

/// Raw classifier outcome for one sentence, before a verdict is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(f64),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSentence {
    #[serde(flatten)]
    pub sentence: Sentence,
    /// `None` when the sentence is unscored.
    pub ai_probability: Option<f64>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoredSentence {
    pub fn is_scored(&self) -> bool {
        self.verdict != Verdict::Unscored
    }
}

// ============ Document level ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentLabel {
    LikelyHuman,
    LikelyAi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVerdict {
    pub mean_ai_probability: f64,
    pub label: DocumentLabel,
    pub source_hint: String,
}

/// The report model. Built once by the aggregator, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub original_text: String,
    /// Byte length of the prefix of `original_text` that was analyzed.
    pub analyzed_len: usize,
    pub sentences: Vec<ScoredSentence>,
    /// `None` iff `undetermined`.
    pub originality_percentage: Option<f64>,
    pub undetermined: bool,
    pub truncated: bool,
    pub threshold: f64,
    pub scored_count: usize,
    pub unscored_count: usize,
    pub human_count: usize,
    pub ai_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentVerdict>,
}

impl AnalysisResult {
    pub fn analyzed_text(&self) -> &str {
        let end = self.analyzed_len.min(self.original_text.len());
        self.original_text.get(..end).unwrap_or(&self.original_text)
    }

    /// Byte ranges of every sentence with an AI verdict, in document order.
    pub fn ai_spans(&self) -> Vec<Range<usize>> {
        self.sentences
            .iter()
            .filter(|s| s.verdict == Verdict::Ai)
            .map(|s| s.sentence.span())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_tie_break_is_ai() {
        assert_eq!(Verdict::from_probability(0.5, 0.5), Verdict::Ai);
        assert_eq!(Verdict::from_probability(0.4999, 0.5), Verdict::Human);
    }

    #[test]
    fn test_scored_sentence_serializes_flat() {
        let s = ScoredSentence {
            sentence: Sentence {
                index: 0,
                text: "Hi.".to_string(),
                start_offset: 0,
                end_offset: 3,
            },
            ai_probability: Some(0.25),
            verdict: Verdict::Human,
            error: None,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["startOffset"], 0);
        assert_eq!(json["endOffset"], 3);
        assert_eq!(json["verdict"], "human");
        assert!(json.get("error").is_none());
    }
}
