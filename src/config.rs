use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://tynch2023.github.io/react-snippets-api";
pub const DEFAULT_CONTENT_FALLBACK: &str = "// Error loading snippet";

const ENV_BASE_URL: &str = "SNIPDEX_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "SNIPDEX_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
    #[serde(default = "default_cache_bust_param")]
    pub cache_bust_param: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Shown in place of the snippet when its fetch fails.
    #[serde(default = "default_content_fallback")]
    pub content_fallback: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_path: default_index_path(),
            cache_bust_param: default_cache_bust_param(),
            timeout_secs: default_timeout_secs(),
            content_fallback: default_content_fallback(),
        }
    }
}

impl BrowserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Values from the environment (including a loaded `.env`) win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => tracing::warn!("[CONFIG] Ignoring invalid {}={:?}", ENV_TIMEOUT_SECS, raw),
            }
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_index_path() -> String {
    "data/index.json".to_string()
}

fn default_cache_bust_param() -> String {
    "nocache".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_content_fallback() -> String {
    DEFAULT_CONTENT_FALLBACK.to_string()
}

pub fn default_config_path() -> PathBuf {
    let Some(dirs) = ProjectDirs::from("com", "snipdex", "snipdex") else {
        return Path::new("snipdex.json").to_path_buf();
    };
    dirs.config_dir().join("config.json")
}

/// Missing or unreadable files fall back to defaults.
pub fn load_config(path: &Path) -> BrowserConfig {
    let Ok(bytes) = fs::read(path) else {
        return BrowserConfig::default();
    };
    match serde_json::from_slice::<BrowserConfig>(&bytes) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("[CONFIG] {} is not valid config, using defaults: {}", path.display(), e);
            BrowserConfig::default()
        }
    }
}

pub fn save_config(path: &Path, cfg: &BrowserConfig) -> Result<(), String> {
    let json = serde_json::to_vec_pretty(cfg).map_err(|e| e.to_string())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    fs::write(path, json).map_err(|e| e.to_string())
}
