use common::retry::BackoffPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Engine tuning knobs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Compare-and-retry rounds when allocating a virtual participation number. Default: 16.
    #[serde(default = "default_virtual_join_max_attempts")]
    pub virtual_join_max_attempts: u32,
    /// Base backoff between allocation rounds, in milliseconds. Default: 2.
    #[serde(default = "default_virtual_join_backoff_base_ms")]
    pub virtual_join_backoff_base_ms: u64,
    /// Backoff ceiling between allocation rounds, in milliseconds. Default: 50.
    #[serde(default = "default_virtual_join_backoff_max_ms")]
    pub virtual_join_backoff_max_ms: u64,
    /// Compare-and-swap rounds for the active participation pointer. Default: 16.
    #[serde(default = "default_pointer_swap_max_attempts")]
    pub pointer_swap_max_attempts: u32,
    /// Format used when an event leaves `format_name` empty. Default: "default".
    #[serde(default = "default_format")]
    pub default_format: String,
}

fn default_virtual_join_max_attempts() -> u32 {
    16
}
fn default_virtual_join_backoff_base_ms() -> u64 {
    2
}
fn default_virtual_join_backoff_max_ms() -> u64 {
    50
}
fn default_pointer_swap_max_attempts() -> u32 {
    16
}
fn default_format() -> String {
    "default".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            virtual_join_max_attempts: default_virtual_join_max_attempts(),
            virtual_join_backoff_base_ms: default_virtual_join_backoff_base_ms(),
            virtual_join_backoff_max_ms: default_virtual_join_backoff_max_ms(),
            pointer_swap_max_attempts: default_pointer_swap_max_attempts(),
            default_format: default_format(),
        }
    }
}

impl EngineConfig {
    pub fn virtual_join_backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(
            self.virtual_join_backoff_base_ms,
            self.virtual_join_backoff_max_ms,
        )
    }
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct EngineAppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
}

impl EngineAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONTEST_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("engine.virtual_join_max_attempts", 16_i64)?
            .set_default("engine.virtual_join_backoff_base_ms", 2_i64)?
            .set_default("engine.virtual_join_backoff_max_ms", 50_i64)?
            .set_default("engine.pointer_swap_max_attempts", 16_i64)?
            .set_default("engine.default_format", "default")?
            .add_source(File::with_name(config_path).required(false))
            // Override from environment (e.g., CONTEST__ENGINE__DEFAULT_FORMAT)
            .add_source(Environment::with_prefix("CONTEST").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
