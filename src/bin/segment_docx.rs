use originality_lib::services::document::read_docx_file;
use originality_lib::services::sentence_segmenter::{describe_sentences, segment, SentenceResult};
use originality_lib::services::text_processor::normalize_input;
use originality_lib::services::truncator::truncate;
use serde::Serialize;
use std::path::Path;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn read_text(path: &str) -> anyhow::Result<String> {
    let p = Path::new(path);
    let is_docx = p
        .extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("docx"))
        .unwrap_or(false);
    if is_docx {
        Ok(read_docx_file(p)?)
    } else {
        Ok(std::fs::read_to_string(p)?)
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin segment_docx -- <path.docx|path.txt> [--max-tokens <n>] [--sentences <n>] [--out <json_path>]\n\nPrints sentence offsets and token counts, and where the token budget cuts the text."
        );
        return Ok(());
    }

    let path = args[1].clone();
    let max_tokens: i32 = parse_arg_value(&args, "--max-tokens")
        .and_then(|s| s.parse().ok())
        .unwrap_or(512);
    let sentences_n: usize = parse_arg_value(&args, "--sentences")
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);
    let out_path = parse_arg_value(&args, "--out");

    let text = normalize_input(&read_text(&path)?);
    let sentences = segment(&text);
    let truncation = truncate(&sentences, max_tokens)?;
    let described = describe_sentences(&sentences);
    let total_tokens: usize = described.iter().map(|s| s.tokens).sum();

    println!("File: {}", path);
    println!("Extracted: {} chars ({} bytes)", text.chars().count(), text.len());
    println!("Sentences: {} ({} tokens)", sentences.len(), total_tokens);
    println!(
        "Budget: {} tokens -> {} sentence(s) kept, analyzed {} of {} bytes{}",
        max_tokens,
        truncation.kept.len(),
        truncation.analyzed_len(),
        text.len(),
        if truncation.was_truncated { " (truncated)" } else { "" }
    );
    println!();

    let cut = truncation.kept.len();
    for s in described.iter().take(sentences_n) {
        if s.index == cut && truncation.was_truncated {
            println!("---- token budget ends here ----");
        }
        println!(
            "[S{:04}] bytes=[{},{}] tokens={}  {}",
            s.index,
            s.start,
            s.end,
            s.tokens,
            preview(&s.text, 120)
        );
    }
    if described.len() > sentences_n {
        println!("... ({} more sentences)", described.len() - sentences_n);
    }

    if let Some(out_path) = out_path {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Output {
            file: String,
            max_tokens: i32,
            extracted_chars: usize,
            extracted_bytes: usize,
            analyzed_bytes: usize,
            kept_sentences: usize,
            was_truncated: bool,
            sentences: Vec<SentenceResult>,
        }

        let out = Output {
            file: path.clone(),
            max_tokens,
            extracted_chars: text.chars().count(),
            extracted_bytes: text.len(),
            analyzed_bytes: truncation.analyzed_len(),
            kept_sentences: truncation.kept.len(),
            was_truncated: truncation.was_truncated,
            sentences: described,
        };

        let json = serde_json::to_string_pretty(&out)?;
        std::fs::write(&out_path, json)?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
