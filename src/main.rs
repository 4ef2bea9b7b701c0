use anyhow::{bail, Context};
use originality_lib::services::config_store::{load_app_config, AppConfig, ClassifierBackend};
use originality_lib::services::document::read_docx_file;
use originality_lib::services::text_processor::{has_content, normalize_input};
use originality_lib::services::report::{render, OutputFormat};
use originality_lib::{DetectError, Detector};
use std::io::{BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const USAGE: &str = "Usage:
  originality [--text <text> | --doc <file.docx>] [--format text|document|json] [--out <path>]
              [--threshold <0..1>] [--max-tokens <n>] [--backend huggingface|stylometry]
              [--model <name>] [--config <config.json>]

Without --text or --doc the text is read from stdin (or prompted for on a terminal).";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn apply_cli_overrides(config: &mut AppConfig, args: &[String]) -> anyhow::Result<()> {
    if let Some(v) = parse_arg_value(args, "--threshold") {
        config.detection.threshold = v.parse().with_context(|| format!("--threshold is not a number: {}", v))?;
    }
    if let Some(v) = parse_arg_value(args, "--max-tokens") {
        config.detection.max_tokens = v.parse().with_context(|| format!("--max-tokens is not an integer: {}", v))?;
    }
    if let Some(v) = parse_arg_value(args, "--backend") {
        config.classifier.backend = match ClassifierBackend::parse(&v) {
            Some(b) => b,
            None => bail!("unknown backend '{}' (expected huggingface or stylometry)", v),
        };
    }
    if let Some(v) = parse_arg_value(args, "--model") {
        config.classifier.model = v;
    }
    if let Some(v) = parse_arg_value(args, "--format") {
        config.report.format = match OutputFormat::parse(&v) {
            Some(f) => f,
            None => bail!("unknown format '{}' (expected text, document or json)", v),
        };
    }
    Ok(())
}

fn read_input(args: &[String]) -> anyhow::Result<String> {
    let text = parse_arg_value(args, "--text");
    let doc = parse_arg_value(args, "--doc");
    match (text, doc) {
        (Some(_), Some(_)) => bail!("--text and --doc cannot be used together"),
        (Some(text), None) => Ok(text),
        (None, Some(doc)) => Ok(read_docx_file(Path::new(&doc))?),
        (None, None) => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Ok(prompt_for_text(&mut stdin.lock(), &mut std::io::stdout())?);
            }
            let mut buf = String::new();
            stdin.lock().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Ask until a line with content arrives. End of input yields an empty string.
fn prompt_for_text<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> std::io::Result<String> {
    write!(out, "Enter the text to analyze: ")?;
    out.flush()?;
    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(String::new());
        }
        if has_content(&line) {
            return Ok(line);
        }
        write!(out, "Text cannot be empty. Try again: ")?;
        out.flush()?;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    originality_lib::init_logging();

    let config_path = parse_arg_value(&args, "--config").map(PathBuf::from);
    let mut config = load_app_config(config_path.as_deref())?;
    apply_cli_overrides(&mut config, &args)?;

    let text = normalize_input(&read_input(&args)?);
    if !has_content(&text) {
        println!("No text provided.");
        return Ok(());
    }

    let format = config.report.format;
    let geometry = config.report.geometry();
    let out_path = parse_arg_value(&args, "--out").map(PathBuf::from);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let detector = Detector::new(config);
    let result = match detector.analyze(&text, &cancel).await {
        Ok(result) => result,
        Err(DetectError::Cancelled) => {
            eprintln!("Analysis cancelled.");
            return Ok(());
        }
        Err(DetectError::ModelUnavailable(reason)) => {
            bail!("The classifier could not be loaded: {}. Check the model name, network access and API token.", reason)
        }
        Err(e) => return Err(e.into()),
    };

    if result.undetermined {
        eprintln!(
            "Result undetermined: none of the {} sentences could be scored.",
            result.sentences.len()
        );
    }

    let rendered = render(&result, format, &geometry)?;
    let out_path = match (out_path, rendered.is_binary()) {
        (Some(p), _) => Some(p),
        (None, true) => Some(PathBuf::from(format!("originality_report.{}", format.extension()))),
        (None, false) => None,
    };

    match out_path {
        Some(path) => {
            std::fs::write(&path, rendered.as_bytes())
                .with_context(|| format!("write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
