//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

const DEFAULT_CALENDAR_ID: &str = "primary";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the sheet store database.
    pub database_path: PathBuf,
    /// Registered client names. Matching is case-insensitive.
    #[serde(default)]
    pub clients: Vec<String>,
    /// Email whose declined invitations are left off the timesheet.
    #[serde(default)]
    pub self_email: String,
    /// Calendar to read events from.
    pub calendar_id: String,
    /// OAuth access token for the Google Calendar API.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("clients", &self.clients)
            .field("self_email", &self.self_email)
            .field("calendar_id", &self.calendar_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("timesheet.db"),
            clients: Vec::new(),
            self_email: String::new(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            access_token: None,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources override earlier ones: defaults, `~/.config/ts/config.toml`,
    /// the file given with `--config`, then `TS_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("TS_"));

        figment.extract()
    }

    /// The access token, if one is configured and not blank.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Returns the platform-specific config directory for ts.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ts"))
}

/// Returns the platform-specific data directory for ts.
///
/// On Linux: `~/.local/share/ts`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ts"))
}
