//! Configuration file management for sage.
//!
//! Provides a TOML-based config file at `~/.config/sage/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sage_core::llm::GeminiConfig;
use sage_core::prompt::HubConfig;
use sage_db::config::DbConfig;

/// Default listen address for `sage serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:3001";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

/// On-disk shape of `config.toml`. Every section and field is optional so
/// a partial file still parses.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub gemini: GeminiSection,
    #[serde(default)]
    pub hub: HubSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GeminiSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HubSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub repo: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the sage config directory.
///
/// Uses the OS config dir (`~/.config/sage` on Linux). Deliberately not
/// `dirs::home_dir().join(".sage")` so the file lands where users expect
/// tool config to live.
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine config directory")?;
    Ok(base.join("sage"))
}

/// Full path to the config file.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file if it exists. Returns `Ok(None)` when absent.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(file))
}

/// Write the config file, creating the directory if needed.
///
/// The file may hold an API key, so on Unix permissions are tightened to
/// owner read/write only.
pub fn save_config(file: &ConfigFile) -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    let path = dir.join("config.toml");
    let raw = toml::to_string_pretty(file).context("failed to serialize config")?;
    std::fs::write(&path, raw)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }
    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Effective configuration after merging CLI flags, environment and file.
#[derive(Debug, Clone)]
pub struct SageConfig {
    pub db_config: DbConfig,
    pub gemini: Option<GeminiConfig>,
    pub hub: Option<HubConfig>,
    pub bind: String,
}

impl SageConfig {
    /// Merge all configuration sources. Optional pieces (Gemini
    /// credentials, prompt store) resolve to `None` when nowhere
    /// configured; commands that need them bail at the call site.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file = load_config()?.unwrap_or_default();

        let db_url = cli_db_url
            .map(str::to_string)
            .or_else(|| std::env::var("SAGE_DATABASE_URL").ok())
            .or(file.database.url);
        let db_config = match db_url {
            Some(url) => DbConfig::new(url),
            None => DbConfig::default(),
        };

        let gemini_key = std::env::var("SAGE_GEMINI_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .or(file.gemini.api_key);
        let gemini = gemini_key.map(|key| {
            let mut config = GeminiConfig::new(key);
            if let Ok(url) = std::env::var("SAGE_GEMINI_BASE_URL") {
                config.base_url = url;
            } else if let Some(url) = file.gemini.base_url {
                config.base_url = url;
            }
            if let Some(secs) = file.gemini.timeout_secs {
                config.timeout_secs = secs;
            }
            config
        });

        let hub_url = std::env::var("SAGE_HUB_URL").ok().or(file.hub.base_url);
        let hub = hub_url.map(|url| {
            let mut config = HubConfig::new(url);
            if let Ok(key) = std::env::var("SAGE_HUB_API_KEY") {
                config.api_key = Some(key);
            } else if let Some(key) = file.hub.api_key {
                config.api_key = Some(key);
            }
            if let Ok(repo) = std::env::var("SAGE_HUB_REPO") {
                config.repo = repo;
            } else if let Some(repo) = file.hub.repo {
                config.repo = repo;
            }
            config
        });

        let bind = std::env::var("SAGE_BIND")
            .ok()
            .or(file.server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        Ok(Self {
            db_config,
            gemini,
            hub,
            bind,
        })
    }

    /// Gemini credentials, or an error telling the user where to put them.
    pub fn require_gemini(&self) -> Result<GeminiConfig> {
        self.gemini.clone().context(
            "no Gemini API key configured; set SAGE_GEMINI_API_KEY or run `sage init` \
             with --gemini-api-key",
        )
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
