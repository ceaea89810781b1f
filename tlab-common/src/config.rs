//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a TOML file. Values resolve in priority order:
//! 1. Command-line argument (handled by each binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing config file is not an error: services start on defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Overrides the root folder holding the database
pub const ENV_ROOT_FOLDER: &str = "TLAB_ROOT_FOLDER";
/// Overrides the label forms login secret
pub const ENV_LOGIN: &str = "TLAB_LOGIN";
/// Overrides the student tokens (comma separated)
pub const ENV_TOKENS: &str = "TLAB_TOKENS";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "tlab.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the database (optional)
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub label_forms: LabelFormsConfig,
    pub student_project: StudentProjectConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Settings of the label forms service (tlab-lf)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelFormsConfig {
    pub port: u16,
    /// Secret expected in the `login` query parameter; required by tlab-lf
    pub login: String,
    /// Document collection of the tandem quick form
    pub collection: String,
    /// Spreadsheet of the full trip form
    pub spreadsheet: String,
    /// Worksheet receiving full trip form rows
    pub worksheet: String,
    /// Domain of the admin console linked from each row
    pub admin_domain: String,
}

impl Default for LabelFormsConfig {
    fn default() -> Self {
        Self {
            port: 5810,
            login: String::new(),
            collection: "Label".to_string(),
            spreadsheet: "labels".to_string(),
            worksheet: "labels".to_string(),
            admin_domain: "fifteen.eu".to_string(),
        }
    }
}

/// Settings of the student project service (tlab-sp)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudentProjectConfig {
    pub port: u16,
    /// Accepted participant tokens; each names the participant's worksheet
    pub tokens: Vec<String>,
    pub spreadsheet: String,
    /// Worksheet holding the answer key
    pub result_worksheet: String,
}

impl Default for StudentProjectConfig {
    fn default() -> Self {
        Self {
            port: 5811,
            tokens: Vec::new(),
            spreadsheet: "students".to_string(),
            result_worksheet: "result".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from an explicit file (must exist)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` if given, else the platform config file if present, else defaults.
    /// Environment overrides are applied last.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => match default_config_path() {
                Some(path) => Self::load(&path)?,
                None => {
                    warn!("No config file found, using built-in defaults");
                    Self::default()
                }
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `TLAB_LOGIN` and `TLAB_TOKENS` over the file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(login) = std::env::var(ENV_LOGIN) {
            self.label_forms.login = login;
        }
        if let Ok(tokens) = std::env::var(ENV_TOKENS) {
            self.student_project.tokens = tokens
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Root folder: CLI → `TLAB_ROOT_FOLDER` → TOML → platform default
    pub fn root_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.root_folder {
            return path.clone();
        }
        default_root_folder()
    }
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

/// First existing platform config file
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("tlab").join("config.toml"));
    let system_config = PathBuf::from("/etc/tlab/config.toml");

    user_config
        .into_iter()
        .chain(std::iter::once(system_config))
        .find(|path| path.exists())
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tlab"))
        .unwrap_or_else(|| PathBuf::from("./tlab_data"))
}
