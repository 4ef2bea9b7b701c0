// Configuration Storage Service
// Handles config file read/write, version backup and environment overrides

use crate::error::DetectError;
use crate::services::report::{OutputFormat, PageGeometry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "roberta-base-openai-detector";
pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            classifier: ClassifierConfig::default(),
            detection: DetectionConfig::default(),
            report: ReportConfig::default(),
            api_keys: HashMap::new(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// Hosted text-classification inference endpoint.
    Huggingface,
    /// Offline stylometric heuristic.
    Stylometry,
}

impl ClassifierBackend {
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_lowercase().as_str() {
            "huggingface" | "hf" | "remote" => Some(Self::Huggingface),
            "stylometry" | "local" | "offline" => Some(Self::Stylometry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Huggingface => "huggingface",
            Self::Stylometry => "stylometry",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Cpu,
    Gpu,
}

impl DevicePreference {
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "cpu" => Some(Self::Cpu),
            "gpu" | "cuda" => Some(Self::Gpu),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    #[serde(default = "default_backend")]
    pub backend: ClassifierBackend,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_device")]
    pub device: DevicePreference,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Label the model uses for machine-generated text.
    #[serde(default = "default_ai_label")]
    pub ai_label: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Hard input limit of the classifier, in words.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: i32,
    /// Resolved at runtime; never written to disk.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: default_model(),
            device: default_device(),
            endpoint: None,
            ai_label: default_ai_label(),
            timeout_secs: default_timeout_secs(),
            max_input_tokens: default_max_input_tokens(),
            api_key: None,
        }
    }
}

impl ClassifierConfig {
    /// Memoization key: only settings that change which model gets constructed.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.backend.as_str(),
            self.model.trim(),
            self.device.as_str(),
            self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT).trim_end_matches('/')
        )
    }

    pub fn endpoint_or_default(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i32,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            threshold: default_threshold(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.max_tokens <= 0 {
            return Err(DetectError::Config(format!(
                "maxTokens must be positive, got {}",
                self.max_tokens
            )));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(DetectError::Config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_concurrency == 0 {
            return Err(DetectError::Config("maxConcurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_page_width")]
    pub page_width: usize,
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            page_width: default_page_width(),
            lines_per_page: default_lines_per_page(),
        }
    }
}

impl ReportConfig {
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry {
            width_chars: self.page_width,
            lines_per_page: self.lines_per_page,
        }
    }
}

fn default_version() -> String { "1.0.0".to_string() }
fn default_backend() -> ClassifierBackend { ClassifierBackend::Huggingface }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_device() -> DevicePreference { DevicePreference::Auto }
fn default_ai_label() -> String { "Fake".to_string() }
fn default_timeout_secs() -> u64 { 60 }
fn default_max_input_tokens() -> i32 { 512 }
fn default_max_tokens() -> i32 { 512 }
fn default_threshold() -> f64 { 0.5 }
fn default_max_concurrency() -> usize { 4 }
fn default_page_width() -> usize { 90 }
fn default_lines_per_page() -> usize { 50 }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Store reading an explicit file; backups go next to it.
    pub fn from_file(config_file: &Path) -> Self {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_dir,
            config_file: config_file.to_path_buf(),
        }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("originality"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        self.cleanup_old_backups(&backup_dir, 10)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), String> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(|e| format!("Failed to read backup dir: {}", e))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Names embed the timestamp, so lexical order is age order.
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    /// Get provider API key from config file
    pub fn get_api_key(&self, provider: &str) -> Result<Option<String>, String> {
        let config = self.load()?;
        Ok(config.api_keys.get(provider).cloned())
    }

    /// Store provider API key in config file
    pub fn set_api_key(&self, provider: &str, key: &str) -> Result<(), String> {
        let mut config = self.load()?;
        config.api_keys.insert(provider.to_string(), key.to_string());
        self.save(&config)
    }
}

/// Apply `ORIGINALITY_*` overrides and resolve the inference API key.
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<(), DetectError> {
    apply_overrides_from(config, |name| std::env::var(name).ok())
}

fn apply_overrides_from<F>(config: &mut AppConfig, lookup: F) -> Result<(), DetectError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("ORIGINALITY_BACKEND") {
        config.classifier.backend = ClassifierBackend::parse(&v)
            .ok_or_else(|| DetectError::Config(format!("unknown backend '{}'", v)))?;
    }
    if let Some(v) = get("ORIGINALITY_MODEL") {
        config.classifier.model = v.trim().to_string();
    }
    if let Some(v) = get("ORIGINALITY_DEVICE") {
        config.classifier.device = DevicePreference::parse(&v)
            .ok_or_else(|| DetectError::Config(format!("unknown device '{}'", v)))?;
    }
    if let Some(v) = get("ORIGINALITY_ENDPOINT") {
        config.classifier.endpoint = Some(v.trim().to_string());
    }
    if let Some(v) = get("ORIGINALITY_MAX_TOKENS") {
        config.detection.max_tokens = v
            .trim()
            .parse()
            .map_err(|_| DetectError::Config(format!("ORIGINALITY_MAX_TOKENS is not an integer: {}", v)))?;
    }
    if let Some(v) = get("ORIGINALITY_THRESHOLD") {
        config.detection.threshold = v
            .trim()
            .parse()
            .map_err(|_| DetectError::Config(format!("ORIGINALITY_THRESHOLD is not a number: {}", v)))?;
    }

    config.classifier.api_key = get("HF_API_TOKEN")
        .or_else(|| get("HUGGINGFACE_API_KEY"))
        .or_else(|| config.api_keys.get("huggingface").cloned())
        .filter(|k| !k.trim().is_empty());

    Ok(())
}

/// Load config from `path` (or the default location) and apply environment overrides.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig, DetectError> {
    let store = match path {
        Some(p) => ConfigStore::from_file(p),
        None => match ConfigStore::default_config_dir() {
            Some(dir) => ConfigStore::new(dir),
            None => {
                let mut config = AppConfig::default();
                apply_env_overrides(&mut config)?;
                return Ok(config);
            }
        },
    };
    let mut config = store.load().map_err(DetectError::Config)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}
