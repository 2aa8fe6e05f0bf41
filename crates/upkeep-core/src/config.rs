use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UpkeepError};
use crate::types::Cadence;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 168; // 7 days
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10; // 10 years
pub const DEFAULT_UPCOMING: usize = 3; // open events/reminders kept per item

/// Top-level config (upkeep.toml + UPKEEP_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpkeepConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed browser origin. `None` allows any origin.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. Required; there is deliberately no default.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Materialization job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default)]
    pub cadence: Cadence,
    /// How many open future events (and unsent reminders) to keep per item.
    #[serde(default = "default_upcoming")]
    pub upcoming: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cadence: Cadence::default(),
            upcoming: DEFAULT_UPCOMING,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_token_ttl_hours() -> i64 {
    DEFAULT_TOKEN_TTL_HOURS
}
fn default_upcoming() -> usize {
    DEFAULT_UPCOMING
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.upkeep/upkeep.db", home)
}

impl UpkeepConfig {
    /// Load config from a TOML file with UPKEEP_* env var overrides.
    ///
    /// Nested keys use a double underscore: `UPKEEP_AUTH__JWT_SECRET`,
    /// `UPKEEP_SERVER__PORT`. A missing file is not an error; every field
    /// has a default except the JWT secret, which `validate` checks.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .merge(Env::prefixed("UPKEEP_").split("__"))
            .extract()
            .map_err(|e| UpkeepError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::new().merge(Toml::file(path))
    }

    /// Reject configurations the server cannot safely run with.
    pub fn validate(&self) -> Result<()> {
        match self.auth.jwt_secret.as_deref() {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(UpkeepError::Config(
                    "auth.jwt_secret is required (set UPKEEP_AUTH__JWT_SECRET)".to_string(),
                ))
            }
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(UpkeepError::Config(format!(
                "auth.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}"
            )));
        }
        if self.scheduler.upcoming == 0 {
            return Err(UpkeepError::Config(
                "scheduler.upcoming must be at least 1".to_string(),
            ));
        }
        self.scheduler
            .cadence
            .validate()
            .map_err(UpkeepError::Config)
    }

    /// The JWT secret. Only meaningful after `validate` succeeded.
    pub fn jwt_secret(&self) -> &str {
        self.auth.jwt_secret.as_deref().unwrap_or_default()
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.upkeep/upkeep.toml", home)
}
