//! Settings for the `kitty` binary.
//!
//! Values come from an optional `settings.toml` and are then overridden by
//! `KITTY__*` environment variables (`KITTY__APP__LEVEL=debug`,
//! `KITTY__ENGINE__MAX_INVITE_ATTEMPTS=16`, ...).

use config::{Config, ConfigError, Environment, File};
use engine::{DEFAULT_MAX_INVITE_ATTEMPTS, RemainderPolicy};
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "settings";
const DEFAULT_SQLITE_PATH: &str = "./kitty.db";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite(DEFAULT_SQLITE_PATH.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Engine {
    pub max_invite_attempts: u32,
    pub remainder_policy: RemainderPolicy,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            max_invite_attempts: DEFAULT_MAX_INVITE_ATTEMPTS,
            remainder_policy: RemainderPolicy::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub engine: Engine,
}

impl Settings {
    /// Loads `path` (without extension, optional) and the environment.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("KITTY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
