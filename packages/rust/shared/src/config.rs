//! Application configuration for frc-docs.
//!
//! User config lives at `~/.frc-docs/frc-docs.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FrcDocsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "frc-docs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".frc-docs";

// ---------------------------------------------------------------------------
// Config structs (matching frc-docs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generative service settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Batching and size limits for page extraction.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Source-tree ingestion settings.
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Where the bundle is written by `scrape` and read by `serve`.
    #[serde(default = "default_bundle_path")]
    pub bundle_path: String,

    /// Maximum depth of the fallback link crawl.
    #[serde(default = "default_crawl_depth")]
    pub crawl_depth: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bundle_path: default_bundle_path(),
            crawl_depth: default_crawl_depth(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_bundle_path() -> String {
    "data/docs.json".into()
}
fn default_crawl_depth() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for HTML to markdown conversion.
    #[serde(default = "default_model")]
    pub model: String,

    /// API root, overridable for testing.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            endpoint: default_endpoint(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemini-3-flash-preview".into()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".into()
}

/// `[extraction]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Pages processed concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches, in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Stripped HTML is truncated to this many characters before conversion.
    #[serde(default = "default_max_html_chars")]
    pub max_html_chars: usize,

    /// Pages whose stripped body is shorter than this are skipped.
    #[serde(default = "default_min_body_chars")]
    pub min_body_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_html_chars: default_max_html_chars(),
            min_body_chars: default_min_body_chars(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}
fn default_batch_delay_ms() -> u64 {
    5000
}
fn default_max_html_chars() -> usize {
    100_000
}
fn default_min_body_chars() -> usize {
    100
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Git repository holding the WPILib reStructuredText sources.
    #[serde(default = "default_wpilib_repo")]
    pub wpilib_repo: String,

    /// Scratch directory for the shallow clone. Defaults to a temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_dir: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            wpilib_repo: default_wpilib_repo(),
            clone_dir: None,
        }
    }
}

impl SourcesConfig {
    /// Resolved clone directory.
    pub fn clone_dir(&self) -> PathBuf {
        match &self.clone_dir {
            Some(dir) => PathBuf::from(dir),
            None => std::env::temp_dir().join("frc-docs-wpilib-source"),
        }
    }
}

fn default_wpilib_repo() -> String {
    "https://github.com/wpilibsuite/frc-docs.git".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.frc-docs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| FrcDocsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.frc-docs/frc-docs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| FrcDocsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| FrcDocsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| FrcDocsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FrcDocsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FrcDocsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the generative service API key from the configured env var.
pub fn api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.gemini.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(FrcDocsError::config(format!(
            "Gemini API key not found. Set the {var_name} environment variable."
        ))),
    }
}
