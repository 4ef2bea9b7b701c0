// Sentence Segmenter
// Splits raw text into ordered sentences whose offsets point into the untouched input.
//
// Heuristic, not a grammar:
// - `.`, `!`, `?`, `…` end a sentence when followed by whitespace or end of text
// - full-width `。！？` end a sentence even without trailing whitespace
// - trailing closing quotes/brackets stay with the sentence they close
// - single-letter initials and common abbreviations never end a sentence
// - a blank line always ends a sentence (titles, list items without punctuation)

use crate::models::Sentence;
use serde::Serialize;

const TERMINATORS: &[char] = &['.', '!', '?', '…'];
const FULL_WIDTH_TERMINATORS: &[char] = &['。', '！', '？'];
const CLOSERS: &[char] = &['"', '\'', ')', ']', '”', '’', '」', '』', '）'];
const OPENERS: &[char] = &['"', '\'', '(', '[', '“', '‘', '「', '『', '（'];

const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "vs.", "mr.", "mrs.", "ms.", "dr.", "prof.", "fig.", "eq.", "no.", "inc.",
    "ltd.", "st.", "jr.", "sr.", "approx.", "cf.",
];

/// Segment `text` into sentences.
///
/// Empty or whitespace-only input yields no sentences. Every returned sentence
/// satisfies `text[s.start_offset..s.end_offset] == s.text`, and sentences are
/// strictly increasing and non-overlapping.
pub fn segment(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut piece_start = 0usize;

    for cut in boundary_offsets(text) {
        push_piece(text, piece_start, cut, &mut sentences);
        piece_start = cut;
    }
    push_piece(text, piece_start, text.len(), &mut sentences);

    sentences
}

fn push_piece(text: &str, start: usize, end: usize, out: &mut Vec<Sentence>) {
    if end <= start {
        return;
    }
    let piece = &text[start..end];
    let trimmed = piece.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = piece.len() - piece.trim_start().len();
    let start_offset = start + lead;
    out.push(Sentence {
        index: out.len(),
        text: trimmed.to_string(),
        start_offset,
        end_offset: start_offset + trimmed.len(),
    });
}

/// Byte offsets at which one sentence piece ends and the next begins.
fn boundary_offsets(text: &str) -> Vec<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut cuts = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, ch) = chars[i];

        if ch == '\n' {
            if starts_blank_line(&chars, i) {
                cuts.push(pos);
            }
            i += 1;
            continue;
        }

        let is_terminator = TERMINATORS.contains(&ch) || FULL_WIDTH_TERMINATORS.contains(&ch);
        if !is_terminator {
            i += 1;
            continue;
        }

        // Swallow the whole terminator run ("?!", "...") plus closing quotes/brackets.
        let mut j = i + 1;
        let mut full_width = FULL_WIDTH_TERMINATORS.contains(&ch);
        let mut run_len = 1usize;
        while j < chars.len() {
            let c = chars[j].1;
            if TERMINATORS.contains(&c) || FULL_WIDTH_TERMINATORS.contains(&c) {
                full_width |= FULL_WIDTH_TERMINATORS.contains(&c);
                run_len += 1;
                j += 1;
            } else if CLOSERS.contains(&c) {
                j += 1;
            } else {
                break;
            }
        }

        let end = chars.get(j).map(|(p, _)| *p).unwrap_or(text.len());
        let followed_by_space = chars.get(j).map(|(_, c)| c.is_whitespace()).unwrap_or(true);
        let single_dot = ch == '.' && run_len == 1;

        if (followed_by_space || full_width) && !(single_dot && is_abbreviation(&text[..pos])) {
            cuts.push(end);
        }
        i = j;
    }

    cuts
}

/// `chars[i]` is a newline; true when only horizontal whitespace separates it from another newline.
fn starts_blank_line(chars: &[(usize, char)], i: usize) -> bool {
    chars[i + 1..]
        .iter()
        .map(|(_, c)| *c)
        .find(|c| *c == '\n' || !c.is_whitespace())
        .map(|c| c == '\n')
        .unwrap_or(false)
}

/// `before` is the text preceding a single `.`; true if that dot closes an initial or abbreviation.
fn is_abbreviation(before: &str) -> bool {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c| OPENERS.contains(&c));
    if word.is_empty() {
        return false;
    }

    let mut letters = word.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        if first.is_alphabetic() && first.is_uppercase() {
            return true;
        }
    }

    let candidate = format!("{}.", word.to_lowercase());
    ABBREVIATIONS.contains(&candidate.as_str())
}

/// Flattened view used by debugging tools.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceResult {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub tokens: usize,
    pub text: String,
}

pub fn describe_sentences(sentences: &[Sentence]) -> Vec<SentenceResult> {
    sentences
        .iter()
        .map(|s| SentenceResult {
            index: s.index,
            start: s.start_offset,
            end: s.end_offset,
            tokens: crate::services::truncator::count_tokens(&s.text),
            text: s.text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        segment(text).into_iter().map(|s| s.text).collect()
    }

    fn assert_offsets(text: &str) {
        let sentences = segment(text);
        let mut last_end = 0usize;
        for (idx, s) in sentences.iter().enumerate() {
            assert_eq!(s.index, idx);
            assert_eq!(&text[s.start_offset..s.end_offset], s.text);
            assert!(s.start_offset >= last_end, "overlap at sentence {}", idx);
            assert!(s.start_offset < s.end_offset);
            last_end = s.end_offset;
        }
    }

    #[test]
    fn test_two_simple_sentences() {
        let text = "This is a test. This is another test.";
        let sentences = segment(text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "This is a test.");
        assert_eq!(sentences[0].start_offset, 0);
        assert_eq!(sentences[0].end_offset, 15);
        assert_eq!(sentences[1].text, "This is another test.");
        assert_eq!(sentences[1].start_offset, 16);
        assert_eq!(sentences[1].end_offset, text.len());
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(segment("").is_empty());
        assert!(segment("   \n\t  \n").is_empty());
    }

    #[test]
    fn test_offsets_skip_leading_whitespace() {
        let text = "   Hello there!   How are you?  ";
        let sentences = segment(text);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].start_offset, 3);
        assert_eq!(sentences[1].text, "How are you?");
        assert_offsets(text);
    }

    #[test]
    fn test_initials_and_abbreviations_do_not_split() {
        assert_eq!(
            texts("J. R. R. Tolkien wrote books. Dr. Smith agreed, e.g. on Monday."),
            vec![
                "J. R. R. Tolkien wrote books.",
                "Dr. Smith agreed, e.g. on Monday."
            ]
        );
    }

    #[test]
    fn test_decimal_numbers_do_not_split() {
        assert_eq!(
            texts("Pi is roughly 3.14 today. Tomorrow too."),
            vec!["Pi is roughly 3.14 today.", "Tomorrow too."]
        );
    }

    #[test]
    fn test_terminator_runs_and_closing_quotes() {
        assert_eq!(
            texts("Wait... What?! He said \"Stop.\" Then he left"),
            vec!["Wait...", "What?!", "He said \"Stop.\"", "Then he left"]
        );
    }

    #[test]
    fn test_full_width_punctuation_splits_without_space() {
        let text = "这是第一句。这是第二句！这是第三句？";
        assert_eq!(texts(text), vec!["这是第一句。", "这是第二句！", "这是第三句？"]);
        assert_offsets(text);
    }

    #[test]
    fn test_blank_line_is_a_boundary() {
        let text = "My Title\n\nThe body starts here. It continues.\nSame paragraph";
        assert_eq!(
            texts(text),
            vec!["My Title", "The body starts here.", "It continues.", "Same paragraph"]
        );
    }

    #[test]
    fn test_offset_invariant_on_mixed_input() {
        for text in [
            "Ünïcödé text é. Second — sentence!  Third?",
            "No terminator at all",
            ".",
            "...   ?!",
            "Line one.\r\n\r\nLine two. (Aside.) Done",
            "A. B. C.",
        ] {
            assert_offsets(text);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Some text. More text! Even more? Yes.";
        assert_eq!(segment(text), segment(text));
    }

    #[test]
    fn test_describe_sentences_counts_tokens() {
        let described = describe_sentences(&segment("One two three. Four."));
        assert_eq!(described.len(), 2);
        assert_eq!(described[0].tokens, 3);
        assert_eq!(described[1].start, 15);
    }
}
