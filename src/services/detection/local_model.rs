// Local Stylometry Classifier
// Offline sentence scorer
//
// Uses soft thresholds (sigmoid) accumulated in logit space, so the output is
// continuous rather than bucketed. Pure and deterministic: same text, same score.

use crate::error::DetectError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::classifier::Classifier;

const BASE_LOGIT: f64 = -1.0;
const MIN_PROBABILITY: f64 = 0.02;
const MAX_PROBABILITY: f64 = 0.98;

/// Connectives and vocabulary that show up disproportionately in generated prose.
const AI_MARKERS: &[&str] = &[
    "furthermore", "moreover", "additionally", "overall", "crucial", "delve", "landscape",
    "leverage", "notably", "comprehensive", "ensure", "significant", "various", "robust",
    "seamless", "pivotal", "utilize", "facilitate", "enhance", "realm", "tapestry",
];

const FIRST_PERSON: &[&str] = &["i", "me", "my", "mine", "we", "us", "our"];

const CONTRACTION_SUFFIXES: &[&str] = &["n't", "'re", "'m", "'ll", "'ve", "'d", "'s"];

/// Sigmoid around `center`; `k` controls steepness (smaller = steeper).
#[inline]
fn sigmoid(x: f64, center: f64, k: f64) -> f64 {
    1.0 / (1.0 + ((x - center) / k).exp())
}

/// 1 - sigmoid, for "greater than" thresholds.
#[inline]
fn sigmoid_inv(x: f64, center: f64, k: f64) -> f64 {
    1.0 - sigmoid(x, center, k)
}

#[inline]
fn from_logit(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9_']+|[\u{4e00}-\u{9fff}]").expect("word regex"))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceFeatures {
    pub word_count: usize,
    pub avg_word_len: f64,
    pub repeat_ratio: f64,
    pub ai_markers: usize,
    pub human_markers: usize,
}

pub fn extract_features(text: &str) -> SentenceFeatures {
    let words: Vec<String> = word_re()
        .find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return SentenceFeatures::default();
    }

    let total = words.len();
    let avg_word_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / total as f64;
    let unique: HashSet<&str> = words.iter().map(|w| w.as_str()).collect();
    let repeat_ratio = 1.0 - unique.len() as f64 / total as f64;

    let ai_markers = words.iter().filter(|w| AI_MARKERS.contains(&w.as_str())).count();
    let first_person = words.iter().filter(|w| FIRST_PERSON.contains(&w.as_str())).count();
    let contractions = words
        .iter()
        .filter(|w| CONTRACTION_SUFFIXES.iter().any(|s| w.ends_with(s)) && w.contains('\''))
        .count();
    let exclamations = text.matches('!').count();
    let human_markers = first_person + contractions + exclamations;

    SentenceFeatures {
        word_count: total,
        avg_word_len,
        repeat_ratio,
        ai_markers,
        human_markers,
    }
}

/// Score features into an AI probability.
pub fn score_features(f: &SentenceFeatures) -> f64 {
    let mut logit = BASE_LOGIT;

    // Long vocabulary leans machine.
    logit += sigmoid_inv(f.avg_word_len, 5.2, 0.6) * 1.2;

    // Repetition inside one sentence.
    logit += sigmoid_inv(f.repeat_ratio, 0.25, 0.06) * 0.6;

    // Length: very short reads human, long and even reads machine.
    let words = f.word_count as f64;
    logit += sigmoid_inv(words, 18.0, 4.0) * 0.5;
    logit -= sigmoid(words, 6.0, 2.0) * 0.6;

    logit += (f.ai_markers as f64 * 0.6).min(2.0);
    logit -= (f.human_markers as f64 * 0.5).min(2.0);

    from_logit(logit).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

pub struct StylometryClassifier {
    name: String,
}

impl StylometryClassifier {
    pub fn new() -> Self {
        Self {
            name: "stylometry-v1".to_string(),
        }
    }
}

impl Default for StylometryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for StylometryClassifier {
    async fn score(&self, text: &str) -> Result<f64, DetectError> {
        let features = extract_features(text);
        if features.word_count == 0 {
            return Err(DetectError::Inference("sentence has no scorable words".to_string()));
        }
        Ok(score_features(&features))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
