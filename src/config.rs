use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extensions: default_extensions(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

impl DocumentsConfig {
    /// Returns true if `ext` (without the dot) is in the allow-set.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_extensions() -> Vec<String> {
    ["txt", "md", "py", "json", "csv", "html", "xml"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// No client-side timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: None,
            timeout_secs: None,
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Reads and validates a TOML config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but falls back to built-in defaults when `path` does
/// not exist. Used for the implicit default config location.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    let docs = &config.documents;
    if docs.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
        bail!("documents.extensions must name at least one extension");
    }
    for pattern in &docs.exclude_globs {
        Glob::new(pattern)
            .with_context(|| format!("Invalid documents.exclude_globs pattern: '{}'", pattern))?;
    }

    match config.model.provider.as_str() {
        "gemini" | "openai" => {}
        other => bail!(
            "Unknown model provider: '{}'. Must be gemini or openai.",
            other
        ),
    }
    if config.model.model.trim().is_empty() {
        bail!("model.model must not be empty");
    }
    if config.model.api_key_env.trim().is_empty() {
        bail!("model.api_key_env must not be empty");
    }
    if config.model.timeout_secs == Some(0) {
        bail!("model.timeout_secs must be > 0 when set");
    }

    Ok(())
}
