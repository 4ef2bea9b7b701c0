// Console report: summary block, then one verdict line per analyzed sentence.

use crate::models::{AnalysisResult, ScoredSentence, Verdict};

use super::summary_lines;

pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    for (_, line) in summary_lines(result) {
        out.push_str(&line);
        out.push('\n');
    }

    if result.sentences.is_empty() {
        out.push_str("\nNo sentences to report.\n");
        return out;
    }

    out.push_str("\nSentence verdicts:\n");
    for s in &result.sentences {
        out.push_str(&format!("{:>4}. {} {}", s.sentence.index + 1, verdict_tag(s), single_line(&s.sentence.text)));
        if let Some(reason) = &s.error {
            out.push_str(&format!("  ({})", reason));
        }
        out.push('\n');
    }
    out
}

/// `[AI 91.0%]`, `[HUMAN 10.0%]` or `[UNSCORED]`; the percentage is the AI probability.
pub fn verdict_tag(s: &ScoredSentence) -> String {
    match (s.verdict, s.ai_probability) {
        (Verdict::Unscored, _) | (_, None) => "[UNSCORED]".to_string(),
        (verdict, Some(p)) => format!("[{} {:.1}%]", verdict.as_str(), p * 100.0),
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
