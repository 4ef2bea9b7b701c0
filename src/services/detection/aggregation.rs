// Aggregation Logic
// Turns per-sentence classifier outcomes into verdicts and one originality percentage.
//
// The percentage is a plain ratio over scored sentences: order does not matter
// and unscored sentences count for nothing.

use crate::models::{
    AnalysisResult, DocumentLabel, DocumentVerdict, ScoreOutcome, ScoredSentence, Sentence, Verdict,
};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Build the immutable report model.
///
/// `analyzed_len` is the byte length of the prefix of `original_text` the
/// sentences were taken from; `threshold` must already be validated.
pub fn aggregate(
    original_text: &str,
    analyzed_len: usize,
    truncated: bool,
    outcomes: Vec<(Sentence, ScoreOutcome)>,
    threshold: f64,
) -> AnalysisResult {
    let sentences: Vec<ScoredSentence> = outcomes
        .into_iter()
        .map(|(sentence, outcome)| score_sentence(sentence, outcome, threshold))
        .collect();

    let human_count = sentences.iter().filter(|s| s.verdict == Verdict::Human).count();
    let ai_count = sentences.iter().filter(|s| s.verdict == Verdict::Ai).count();
    let scored_count = human_count + ai_count;
    let unscored_count = sentences.len() - scored_count;

    let undetermined = scored_count == 0;
    let originality_percentage = if undetermined {
        None
    } else {
        Some(originality_percentage(human_count, ai_count))
    };

    let document = if undetermined {
        None
    } else {
        let sum: f64 = sentences.iter().filter_map(|s| s.ai_probability).sum();
        Some(document_verdict(human_count, ai_count, sum / scored_count as f64))
    };

    AnalysisResult {
        original_text: original_text.to_string(),
        analyzed_len: analyzed_len.min(original_text.len()),
        sentences,
        originality_percentage,
        undetermined,
        truncated,
        threshold,
        scored_count,
        unscored_count,
        human_count,
        ai_count,
        document,
    }
}

fn score_sentence(sentence: Sentence, outcome: ScoreOutcome, threshold: f64) -> ScoredSentence {
    match outcome {
        ScoreOutcome::Scored(p) => ScoredSentence {
            sentence,
            ai_probability: Some(p),
            verdict: Verdict::from_probability(p, threshold),
            error: None,
        },
        ScoreOutcome::Failed(reason) => ScoredSentence {
            sentence,
            ai_probability: None,
            verdict: Verdict::Unscored,
            error: Some(reason),
        },
    }
}

/// `100 * human / (human + ai)`; callers guarantee a non-zero denominator.
pub fn originality_percentage(human: usize, ai: usize) -> f64 {
    100.0 * human as f64 / (human + ai) as f64
}

/// The label follows the same verdict counts as the percentage, ties to AI;
/// the mean only feeds the confidence figure and the source hint.
fn document_verdict(human_count: usize, ai_count: usize, mean_ai_probability: f64) -> DocumentVerdict {
    let label = if ai_count >= human_count {
        DocumentLabel::LikelyAi
    } else {
        DocumentLabel::LikelyHuman
    };
    DocumentVerdict {
        mean_ai_probability,
        label,
        source_hint: source_hint(label, mean_ai_probability).to_string(),
    }
}

/// Rough provenance guess from the AI confidence, for AI-labelled documents.
pub fn source_hint(label: DocumentLabel, mean_ai_probability: f64) -> &'static str {
    let confidence = mean_ai_probability * 100.0;
    match label {
        DocumentLabel::LikelyHuman => "Looks convincingly human-written",
        DocumentLabel::LikelyAi if confidence > 98.0 => "Very structured; GPT-4 / Claude class model",
        DocumentLabel::LikelyAi if confidence > 90.0 => "ChatGPT / Gemini class model",
        DocumentLabel::LikelyAi => "Basic AI or paraphrasing tool",
    }
}
