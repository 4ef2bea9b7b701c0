// Token Budget Truncation
//
// Tokens are whitespace-delimited words. The count is model-agnostic and
// additive over sentences, so the cumulative budget check is monotonic and the
// scan can stop at the first sentence that does not fit.

use crate::error::DetectError;
use crate::models::Sentence;

#[derive(Debug, Clone, PartialEq)]
pub struct Truncation {
    pub kept: Vec<Sentence>,
    pub was_truncated: bool,
}

impl Truncation {
    /// Byte offset just past the last kept sentence (0 when nothing was kept).
    pub fn analyzed_len(&self) -> usize {
        self.kept.last().map(|s| s.end_offset).unwrap_or(0)
    }
}

/// Estimate token count as the number of whitespace-delimited words.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep the longest prefix of `sentences` whose cumulative token count fits `max_tokens`.
///
/// A first sentence that alone exceeds the budget is clipped to its first
/// `max_tokens` words, so non-empty input never yields zero sentences.
pub fn truncate(sentences: &[Sentence], max_tokens: i32) -> Result<Truncation, DetectError> {
    if max_tokens <= 0 {
        return Err(DetectError::Config(format!(
            "max_tokens must be positive, got {}",
            max_tokens
        )));
    }
    let budget = max_tokens as usize;

    let mut kept: Vec<Sentence> = Vec::new();
    let mut used = 0usize;

    for sentence in sentences {
        let tokens = count_tokens(&sentence.text);
        if used + tokens > budget {
            if kept.is_empty() {
                kept.push(clip_sentence(sentence, budget));
            }
            return Ok(Truncation {
                kept,
                was_truncated: true,
            });
        }
        used += tokens;
        kept.push(sentence.clone());
    }

    Ok(Truncation {
        kept,
        was_truncated: false,
    })
}

/// Cut a sentence after its `budget`-th word, keeping offsets aligned with the source.
fn clip_sentence(sentence: &Sentence, budget: usize) -> Sentence {
    let end = word_spans(&sentence.text)
        .nth(budget.saturating_sub(1))
        .map(|(_, end)| end)
        .unwrap_or(sentence.text.len());

    Sentence {
        index: sentence.index,
        text: sentence.text[..end].to_string(),
        start_offset: sentence.start_offset,
        end_offset: sentence.start_offset + end,
    }
}

/// Byte ranges of whitespace-delimited words in `text`.
fn word_spans(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut start: Option<usize> = None;
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || {
        while let Some((pos, ch)) = chars.next() {
            if ch.is_whitespace() {
                if let Some(s) = start.take() {
                    return Some((s, pos));
                }
            } else if start.is_none() {
                start = Some(pos);
            }
            if chars.peek().is_none() {
                if let Some(s) = start.take() {
                    return Some((s, pos + ch.len_utf8()));
                }
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sentence_segmenter::segment;

    fn sentences(text: &str) -> Vec<Sentence> {
        segment(text)
    }

    #[test]
    fn test_count_tokens() {
        assert_eq!(count_tokens("Hello   world"), 2);
        assert_eq!(count_tokens(""), 0);
        assert_eq!(count_tokens(" one\ttwo\nthree "), 3);
    }

    #[test]
    fn test_non_positive_budget_is_config_error() {
        let input = sentences("One. Two.");
        assert!(matches!(truncate(&input, 0), Err(DetectError::Config(_))));
        assert!(matches!(truncate(&input, -5), Err(DetectError::Config(_))));
    }

    #[test]
    fn test_stops_at_first_sentence_over_budget() {
        // token counts [2, 2, 1]
        let input = sentences("Hello there. General Kenobi. Yes.");
        let result = truncate(&input, 3).unwrap();
        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.kept[0].text, "Hello there.");
        assert!(result.was_truncated);
    }

    #[test]
    fn test_everything_fits() {
        let input = sentences("Hello there. General Kenobi. Yes.");
        let result = truncate(&input, 5).unwrap();
        assert_eq!(result.kept.len(), 3);
        assert!(!result.was_truncated);
        assert_eq!(result.analyzed_len(), input[2].end_offset);
    }

    #[test]
    fn test_oversized_first_sentence_is_clipped() {
        let text = "  one two three four five.";
        let input = sentences(text);
        let result = truncate(&input, 2).unwrap();
        assert_eq!(result.kept.len(), 1);
        assert!(result.was_truncated);
        let kept = &result.kept[0];
        assert_eq!(kept.text, "one two");
        assert_eq!(&text[kept.start_offset..kept.end_offset], "one two");
    }

    #[test]
    fn test_empty_input_is_not_truncated() {
        let result = truncate(&[], 10).unwrap();
        assert!(result.kept.is_empty());
        assert!(!result.was_truncated);
        assert_eq!(result.analyzed_len(), 0);
    }

    #[test]
    fn test_monotonic_in_budget() {
        let input = sentences(
            "A short one. Then a somewhat longer sentence follows here. Tiny. \
             Another sentence with several words in it. End.",
        );
        let mut previous = 0usize;
        for budget in 1..40 {
            let kept = truncate(&input, budget).unwrap().kept.len();
            assert!(kept >= previous, "budget {} kept {} < {}", budget, kept, previous);
            assert!(kept >= 1);
            previous = kept;
        }
    }

    #[test]
    fn test_word_spans_handle_unicode() {
        let spans: Vec<_> = word_spans("héllo  wörld").collect();
        assert_eq!(spans, vec![(0, 6), (8, 14)]);
    }
}
