// PDF Writer
// Minimal PDF 1.4 output for a paginated report layout.
// Page size comes from `PageGeometry` through `page_size`, on the same
// character grid `layout::paginate` wraps to.
//
// Courier 10pt on a fixed cell grid (6pt per character, 14pt leading), so a
// highlight column range maps to an exact rectangle. No timestamps or IDs are
// written: equal layouts produce equal bytes.

use super::layout::{LayoutLine, LineKind, ReportLayout};
use super::PageGeometry;

const FONT_SIZE: usize = 10;
const CHAR_WIDTH: usize = 6;
const LEADING: usize = 14;
const MARGIN: usize = 40;
const FOOTER: usize = 20;
/// Baseline offset from the top of a line cell.
const ASCENT: usize = 10;
const HIGHLIGHT_RGB: &str = "1 0.82 0.82";

pub fn page_size(geometry: &PageGeometry) -> (usize, usize) {
    let width = 2 * MARGIN + geometry.width_chars * CHAR_WIDTH;
    let height = 2 * MARGIN + geometry.lines_per_page * LEADING + FOOTER;
    (width, height)
}

pub fn render_pdf(layout: &ReportLayout, geometry: &PageGeometry) -> Vec<u8> {
    let (page_width, page_height) = page_size(geometry);
    let page_count = layout.pages.len().max(1);

    // 1 catalog, 2 pages, 3 regular font, 4 bold font, then (page, content) pairs.
    let page_id = |i: usize| 5 + 2 * i;
    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", page_id(i))).collect();

    let mut writer = PdfWriter::new();
    writer.object(1, "<< /Type /Catalog /Pages 2 0 R >>".to_string());
    writer.object(
        2,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), page_count),
    );
    writer.object(
        3,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>".to_string(),
    );
    writer.object(
        4,
        "<< /Type /Font /Subtype /Type1 /BaseFont /Courier-Bold /Encoding /WinAnsiEncoding >>".to_string(),
    );

    for i in 0..page_count {
        let lines: &[LayoutLine] = layout.pages.get(i).map(|p| p.lines.as_slice()).unwrap_or(&[]);
        let content = page_content(lines, i + 1, page_count, page_height);
        writer.object(
            page_id(i),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                page_width,
                page_height,
                page_id(i) + 1
            ),
        );
        writer.stream(page_id(i) + 1, &content);
    }

    writer.finish(1)
}

fn page_content(lines: &[LayoutLine], number: usize, total: usize, page_height: usize) -> String {
    let top = page_height - MARGIN;
    let mut out = String::new();

    let mut rects = String::new();
    for (row, line) in lines.iter().enumerate() {
        let cell_top = top - row * LEADING;
        for cols in &line.highlights {
            rects.push_str(&format!(
                "{} {} {} {} re f\n",
                MARGIN + cols.start * CHAR_WIDTH,
                cell_top - LEADING,
                (cols.end - cols.start) * CHAR_WIDTH,
                LEADING
            ));
        }
    }
    if !rects.is_empty() {
        out.push_str(&format!("q {} rg\n", HIGHLIGHT_RGB));
        out.push_str(&rects);
        out.push_str("Q\n");
    }

    for (row, line) in lines.iter().enumerate() {
        if line.text.is_empty() {
            continue;
        }
        let font = if line.kind == LineKind::Title { "F2" } else { "F1" };
        out.push_str(&format!(
            "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
            font,
            FONT_SIZE,
            MARGIN,
            top - row * LEADING - ASCENT,
            escape(&line.text)
        ));
    }

    out.push_str(&format!(
        "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
        FONT_SIZE,
        MARGIN,
        MARGIN,
        escape(&format!("Page {} of {}", number, total))
    ));
    out
}

/// PDF string literal body. Non-ASCII characters become `?` one for one so
/// column positions stay aligned with the layout.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Sequential object writer that records byte offsets for the xref table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: String) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
    }

    fn stream(&mut self, id: usize, content: &str) {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(
            format!(
                "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                id,
                content.len(),
                content
            )
            .as_bytes(),
        );
    }

    fn finish(mut self, root: usize) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);
        let size = self.offsets.last().map(|(id, _)| id + 1).unwrap_or(1);
        let xref_at = self.buf.len();

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        let mut next = 1;
        for (id, offset) in &self.offsets {
            while next < *id {
                xref.push_str("0000000000 65535 f \n");
                next += 1;
            }
            xref.push_str(&format!("{:010} 00000 n \n", offset));
            next = id + 1;
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, root, xref_at
        ));
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::result_for;
    use super::super::layout::paginate;
    use super::*;

    fn pdf_for(text: &str, scores: &[Option<f64>], geometry: PageGeometry) -> String {
        let result = result_for(text, scores);
        let layout = paginate(&result, &geometry).unwrap();
        String::from_utf8_lossy(&render_pdf(&layout, &geometry)).into_owned()
    }

    #[test]
    fn test_structure() {
        let pdf = pdf_for("This is a test. This is another test.", &[Some(0.1), Some(0.9)], PageGeometry::default());
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("/Count 1"));
        assert!(pdf.contains("/MediaBox [0 0 620 800]"));
        assert!(pdf.contains("(Page 1 of 1) Tj"));
    }

    #[test]
    fn test_highlight_rectangle_matches_sentence_columns() {
        let pdf = pdf_for("This is a test. This is another test.", &[Some(0.1), Some(0.9)], PageGeometry::default());
        // Second sentence starts at column 16 and spans 21 columns.
        let x = MARGIN + 16 * CHAR_WIDTH;
        let w = 21 * CHAR_WIDTH;
        assert!(pdf.contains(&format!("{} ", x)));
        assert!(pdf.contains(&format!(" {} {} re f", w, LEADING)));
        assert_eq!(pdf.matches(" re f").count(), 1);
    }

    #[test]
    fn test_human_only_has_no_highlight() {
        let pdf = pdf_for("Plain human words.", &[Some(0.2)], PageGeometry::default());
        assert!(!pdf.contains(" re f"));
    }

    #[test]
    fn test_multiple_pages() {
        let text: String = (0..30).map(|i| format!("Line {} of the essay goes here. ", i)).collect();
        let geometry = PageGeometry { width_chars: 30, lines_per_page: 5 };
        let pdf = pdf_for(&text, &[], geometry);
        let result = result_for(&text, &[]);
        let pages = paginate(&result, &geometry).unwrap().pages.len();
        assert!(pages > 1);
        assert!(pdf.contains(&format!("/Count {}", pages)));
        assert!(pdf.contains(&format!("(Page {} of {}) Tj", pages, pages)));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape("naïve 测试"), "na?ve ??");
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let result = result_for("Short text.", &[Some(0.7)]);
        let geometry = PageGeometry::default();
        let bytes = render_pdf(&paginate(&result, &geometry).unwrap(), &geometry);
        let pdf = String::from_utf8_lossy(&bytes).into_owned();
        // The table itself, not the `startxref` keyword in the trailer.
        let xref_start = pdf.rfind("\nxref\n").unwrap() + 1;
        let entries: Vec<&str> = pdf[xref_start..].lines().skip(3).take_while(|l| l.ends_with(" n ")).collect();
        assert_eq!(entries.len(), 6);
        for (i, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(bytes[offset..].starts_with(format!("{} 0 obj", i + 1).as_bytes()));
        }

        let startxref: usize = pdf
            .lines()
            .skip_while(|l| *l != "startxref")
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert!(bytes[startxref..].starts_with(b"xref\n0 7\n"));
    }
}
