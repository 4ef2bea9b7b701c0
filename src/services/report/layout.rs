// Report Layout
// Greedy word wrap and pagination of the original text, with AI highlights
// carried as per-line column ranges.
//
// Highlights are computed from byte ranges, not from the page a sentence
// starts on: every wrapped line intersects its own source range with the AI
// sentence spans, so a sentence broken across lines or pages stays marked
// on all of them.

use crate::error::DetectError;
use crate::models::AnalysisResult;
use std::ops::Range;

use super::{summary_lines, PageGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Summary,
    Body,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLine {
    pub text: String,
    pub kind: LineKind,
    /// Byte range of the original text this line reproduces; body lines only.
    pub source: Option<Range<usize>>,
    /// Highlighted character columns, sorted and non-overlapping.
    pub highlights: Vec<Range<usize>>,
}

impl LayoutLine {
    fn plain(kind: LineKind, text: String) -> Self {
        Self {
            text,
            kind,
            source: None,
            highlights: Vec::new(),
        }
    }

    fn blank() -> Self {
        Self::plain(LineKind::Blank, String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub lines: Vec<LayoutLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    pub pages: Vec<Page>,
}

impl ReportLayout {
    pub fn lines(&self) -> impl Iterator<Item = &LayoutLine> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

const ANALYSIS_STOPPED: &str = "[Analysis stopped here: token budget reached. The text below was not scored.]";

/// Lay out the summary block and the original text on fixed-size pages.
///
/// Text past the analyzed prefix is reproduced after a marker line and never
/// highlighted.
pub fn paginate(result: &AnalysisResult, geometry: &PageGeometry) -> Result<ReportLayout, DetectError> {
    geometry.validate()?;
    let width = geometry.width_chars;

    let mut lines = Vec::new();
    for (kind, text) in summary_lines(result) {
        for range in wrap_ranges(&text, width) {
            lines.push(LayoutLine::plain(kind, display_text(&text[range])));
        }
    }
    lines.push(LayoutLine::blank());

    let text = result.original_text.as_str();
    if text.trim().is_empty() {
        lines.push(LayoutLine::plain(LineKind::Summary, "No text was analyzed.".to_string()));
    } else {
        let spans = result.ai_spans();
        let analyzed = result.analyzed_text();
        let cut = analyzed.len();
        let rest = &text[cut..];
        let rest_start = cut + (rest.len() - rest.trim_start().len());

        lines.extend(body_lines(analyzed, 0, &spans, width));
        if rest_start < text.len() {
            for range in wrap_ranges(ANALYSIS_STOPPED, width) {
                lines.push(LayoutLine::plain(LineKind::Summary, ANALYSIS_STOPPED[range].to_string()));
            }
            lines.extend(body_lines(&text[rest_start..], rest_start, &[], width));
        }
    }

    let pages = lines
        .chunks(geometry.lines_per_page)
        .enumerate()
        .map(|(i, chunk)| Page {
            number: i + 1,
            lines: chunk.to_vec(),
        })
        .collect();
    Ok(ReportLayout { pages })
}

/// Body lines for `text`, which starts at byte `base` of the original text.
fn body_lines(text: &str, base: usize, spans: &[Range<usize>], width: usize) -> Vec<LayoutLine> {
    let mut out = Vec::new();
    let mut offset = base;
    for raw in text.split('\n') {
        let base = offset;
        offset += raw.len() + 1;

        let ranges = wrap_ranges(raw, width);
        if ranges.is_empty() {
            out.push(LayoutLine::blank());
            continue;
        }
        for range in ranges {
            let source = base + range.start..base + range.end;
            let slice = &raw[range];
            out.push(LayoutLine {
                text: display_text(slice),
                kind: LineKind::Body,
                highlights: highlight_columns(slice, &source, spans),
                source: Some(source),
            });
        }
    }
    out
}

/// Greedy wrap of one paragraph into byte ranges of at most `width` characters.
/// Whitespace at a wrap point is dropped; words longer than a line are hard-broken.
pub fn wrap_ranges(line: &str, width: usize) -> Vec<Range<usize>> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current: Option<Range<usize>> = None;

    for word in words(line) {
        if let Some(cur) = current.as_mut() {
            if char_len(&line[cur.start..word.end]) <= width {
                cur.end = word.end;
                continue;
            }
            out.push(cur.clone());
            current = None;
        }

        let mut start = word.start;
        while char_len(&line[start..word.end]) > width {
            let split = advance_chars(line, start, width);
            out.push(start..split);
            start = split;
        }
        current = Some(start..word.end);
    }

    if let Some(cur) = current {
        out.push(cur);
    }
    out
}

fn words(line: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(s..line.len());
    }
    out
}

/// Column ranges of `slice` covered by AI spans; gaps of pure whitespace are bridged.
fn highlight_columns(slice: &str, source: &Range<usize>, spans: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut columns: Vec<Range<usize>> = Vec::new();
    for span in spans {
        let start = span.start.max(source.start);
        let end = span.end.min(source.end);
        if start >= end {
            continue;
        }
        let (Some(before), Some(inside)) = (
            slice.get(..start - source.start),
            slice.get(start - source.start..end - source.start),
        ) else {
            continue;
        };
        let col_start = char_len(before);
        let col = col_start..col_start + char_len(inside);

        if let Some(last) = columns.last_mut() {
            let gap: String = slice.chars().skip(last.end).take(col.start.saturating_sub(last.end)).collect();
            if gap.chars().all(char::is_whitespace) {
                last.end = col.end;
                continue;
            }
        }
        columns.push(col);
    }
    columns
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn advance_chars(line: &str, start: usize, n: usize) -> usize {
    line[start..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| start + i)
        .unwrap_or(line.len())
}

/// One display cell per character; control characters become spaces.
fn display_text(s: &str) -> String {
    s.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::result_for;
    use super::*;

    fn geometry(width_chars: usize, lines_per_page: usize) -> PageGeometry {
        PageGeometry { width_chars, lines_per_page }
    }

    fn body(layout: &ReportLayout) -> Vec<&LayoutLine> {
        layout.lines().filter(|l| l.kind == LineKind::Body).collect()
    }

    #[test]
    fn test_wrap_is_greedy() {
        let line = "the quick brown fox jumps over";
        let ranges = wrap_ranges(line, 10);
        let parts: Vec<&str> = ranges.iter().map(|r| &line[r.clone()]).collect();
        assert_eq!(parts, vec!["the quick", "brown fox", "jumps over"]);
    }

    #[test]
    fn test_wrap_hard_breaks_long_words() {
        let line = "abcdefghijkl xy";
        let ranges = wrap_ranges(line, 5);
        let parts: Vec<&str> = ranges.iter().map(|r| &line[r.clone()]).collect();
        assert_eq!(parts, vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        let line = "héllo wörld";
        let ranges = wrap_ranges(line, 5);
        let parts: Vec<&str> = ranges.iter().map(|r| &line[r.clone()]).collect();
        assert_eq!(parts, vec!["héllo", "wörld"]);
    }

    #[test]
    fn test_every_line_fits_and_pages_are_full() {
        let text: String = (0..40).map(|i| format!("Sentence number {} is here. ", i)).collect();
        let result = result_for(&text, &[]);
        let g = geometry(30, 7);
        let layout = paginate(&result, &g).unwrap();
        assert!(layout.pages.len() > 1);
        for page in &layout.pages[..layout.pages.len() - 1] {
            assert_eq!(page.lines.len(), 7);
        }
        assert!(layout.lines().all(|l| l.text.chars().count() <= 30));
        let numbers: Vec<usize> = layout.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, (1..=layout.pages.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_no_text_is_dropped() {
        let text = "First line of text here.\n\nSecond paragraph after a blank line. It has two sentences.";
        let result = result_for(text, &[]);
        let layout = paginate(&result, &geometry(12, 5)).unwrap();
        let reproduced: Vec<String> = text
            .split_whitespace()
            .map(|w| w.to_string())
            .collect();
        let laid_out: Vec<String> = body(&layout)
            .iter()
            .flat_map(|l| l.text.split_whitespace().map(|w| w.to_string()).collect::<Vec<_>>())
            .collect();
        assert_eq!(laid_out, reproduced);
        for line in body(&layout) {
            let source = line.source.clone().unwrap();
            assert_eq!(&text[source], line.text);
        }
    }

    #[test]
    fn test_highlight_covers_exact_sentence_columns() {
        let text = "This is a test. This is another test.";
        let result = result_for(text, &[Some(0.1), Some(0.9)]);
        let layout = paginate(&result, &geometry(90, 50)).unwrap();
        let lines = body(&layout);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].highlights, vec![16..37]);
    }

    #[test]
    fn test_adjacent_ai_sentences_merge() {
        let text = "One is here. Two is here.";
        let result = result_for(text, &[Some(0.9), Some(0.9)]);
        let layout = paginate(&result, &geometry(90, 50)).unwrap();
        assert_eq!(body(&layout)[0].highlights, vec![0..text.len()]);
    }

    #[test]
    fn test_highlight_continues_across_page_break() {
        let text = "Short human one. This machine sentence is long enough to wrap over several lines.";
        let result = result_for(text, &[Some(0.1), Some(0.95)]);
        let unpaged = paginate(&result, &geometry(20, 1000)).unwrap();
        let header_lines = unpaged.line_count() - body(&unpaged).len();

        // Break the page after the second body line, inside the AI sentence.
        let layout = paginate(&result, &geometry(20, header_lines + 2)).unwrap();
        assert!(layout.pages.len() >= 2);

        let ai = result.sentences[1].sentence.span();
        for line in body(&layout) {
            let source = line.source.clone().unwrap();
            if source.start >= ai.start && source.end <= ai.end {
                assert_eq!(line.highlights, vec![0..line.text.chars().count()], "line {:?}", line.text);
            } else {
                assert!(line.highlights.is_empty(), "line {:?}", line.text);
            }
        }

        let second_page_body: Vec<&LayoutLine> = layout.pages[1]
            .lines
            .iter()
            .filter(|l| l.kind == LineKind::Body)
            .collect();
        assert!(!second_page_body.is_empty());
        assert!(second_page_body.iter().all(|l| !l.highlights.is_empty()));
    }

    #[test]
    fn test_summary_block_opens_first_page() {
        let result = result_for("Some words here.", &[Some(0.2)]);
        let layout = paginate(&result, &geometry(90, 50)).unwrap();
        let first = &layout.pages[0].lines;
        assert_eq!(first[0].kind, LineKind::Title);
        assert_eq!(first[0].text, "Originality Report");
        assert!(first.iter().any(|l| l.text == "Originality: 100.00% human-written"));
    }

    #[test]
    fn test_empty_result_still_lays_out() {
        let result = result_for("", &[]);
        let layout = paginate(&result, &geometry(90, 50)).unwrap();
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.lines().any(|l| l.text == "No text was analyzed."));
    }

    #[test]
    fn test_truncated_input_is_reproduced_in_full() {
        use crate::models::ScoreOutcome;
        use crate::services::detection::aggregation::aggregate;
        use crate::services::sentence_segmenter::segment;
        use crate::services::truncator::truncate;

        let text = "Hello there. General Kenobi. Yes.";
        let truncation = truncate(&segment(text), 3).unwrap();
        assert!(truncation.was_truncated);
        let outcomes = truncation
            .kept
            .iter()
            .cloned()
            .map(|s| (s, ScoreOutcome::Scored(0.9)))
            .collect();
        let result = aggregate(text, truncation.analyzed_len(), true, outcomes, 0.5);

        let layout = paginate(&result, &geometry(90, 50)).unwrap();
        let lines = body(&layout);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello there.", "General Kenobi. Yes."]);
        assert_eq!(lines[0].highlights, vec![0..12]);
        assert!(lines[1].highlights.is_empty());
        assert_eq!(&text[lines[1].source.clone().unwrap()], "General Kenobi. Yes.");

        let all: Vec<&str> = layout.lines().map(|l| l.text.as_str()).collect();
        let marker = all.iter().position(|l| l.starts_with("[Analysis stopped here")).unwrap();
        assert_eq!(all[marker - 1], "Hello there.");
        assert_eq!(all[marker + 1], "General Kenobi. Yes.");
    }

    #[test]
    fn test_clipped_first_sentence_keeps_its_tail() {
        use crate::models::ScoreOutcome;
        use crate::services::detection::aggregation::aggregate;
        use crate::services::sentence_segmenter::segment;
        use crate::services::truncator::truncate;

        let text = "one two three four five. Six.";
        let truncation = truncate(&segment(text), 3).unwrap();
        let outcomes = truncation
            .kept
            .iter()
            .cloned()
            .map(|s| (s, ScoreOutcome::Scored(0.1)))
            .collect();
        let result = aggregate(text, truncation.analyzed_len(), true, outcomes, 0.5);

        let layout = paginate(&result, &geometry(90, 50)).unwrap();
        let texts: Vec<&str> = body(&layout).iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one two three", "four five. Six."]);
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let result = result_for("Text.", &[]);
        assert!(matches!(paginate(&result, &geometry(0, 10)), Err(DetectError::Render(_))));
    }
}
