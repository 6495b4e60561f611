use crate::drag::DEFAULT_ACTIVATION_DISTANCE;
use crate::upload::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_UPLOAD_LATENCY};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Where dashboard state is kept between sessions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    Sqlite(PathBuf),
    /// Nothing survives the process
    Memory,
}

/// Application configuration.
/// In debug builds a `.env` file is loaded into the environment first.
#[derive(Clone, Debug)]
pub struct Config {
    pub store: StoreLocation,
    /// Per-file upload ceiling
    pub max_upload_bytes: u64,
    /// Simulated transfer latency
    pub upload_latency: Duration,
    /// Pointer travel before a press becomes a drag
    pub drag_activation_distance: f32,
    pub debug: bool,
    /// Whether a `.env` file was found
    pub env_file_loaded: bool,
}

impl Config {
    /// Load configuration from the environment
    pub fn load() -> Result<Self, ConfigError> {
        #[cfg(debug_assertions)]
        let env_file_loaded = dotenvy::dotenv().is_ok();
        #[cfg(not(debug_assertions))]
        let env_file_loaded = false;

        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        config.env_file_loaded = env_file_loaded;
        Ok(config)
    }

    /// Build from any variable source; `lookup` returns `None` for unset vars
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = if parse_flag(lookup("DASHDECK_MEMORY_STORE")) {
            StoreLocation::Memory
        } else {
            match lookup("DASHDECK_STORE_PATH") {
                Some(path) if !path.trim().is_empty() => StoreLocation::Sqlite(PathBuf::from(path)),
                _ => StoreLocation::Sqlite(default_store_path()?),
            }
        };

        let max_upload_bytes = match lookup("DASHDECK_MAX_UPLOAD_BYTES") {
            Some(value) => parse_number::<u64>("DASHDECK_MAX_UPLOAD_BYTES", value)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let upload_latency = match lookup("DASHDECK_UPLOAD_LATENCY_MS") {
            Some(value) => Duration::from_millis(parse_number("DASHDECK_UPLOAD_LATENCY_MS", value)?),
            None => DEFAULT_UPLOAD_LATENCY,
        };

        let drag_activation_distance = match lookup("DASHDECK_DRAG_ACTIVATION_PX") {
            Some(value) => {
                let distance: f32 = parse_number("DASHDECK_DRAG_ACTIVATION_PX", value.clone())?;
                if !distance.is_finite() || distance < 0.0 {
                    return Err(ConfigError::Invalid {
                        var: "DASHDECK_DRAG_ACTIVATION_PX",
                        value,
                        reason: "must be a non-negative number".to_string(),
                    });
                }
                distance
            }
            None => DEFAULT_ACTIVATION_DISTANCE,
        };

        Ok(Config {
            store,
            max_upload_bytes,
            upload_latency,
            drag_activation_distance,
            debug: parse_flag(lookup("DASHDECK_DEBUG")),
            env_file_loaded: false,
        })
    }

    /// Log the effective configuration. Call once logging is up.
    pub fn log_summary(&self) {
        if self.env_file_loaded {
            info!("Config: loaded .env file");
        }
        match &self.store {
            StoreLocation::Sqlite(path) => info!("Config: store at {}", path.display()),
            StoreLocation::Memory => info!("Config: in-memory store, nothing will persist"),
        }
        info!(
            "Config: upload limit {} bytes, latency {:?}, drag activation {}px",
            self.max_upload_bytes, self.upload_latency, self.drag_activation_distance
        );
    }
}

/// `~/.dashdeck/dashboard.db`
pub fn default_store_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home_dir.join(".dashdeck").join("dashboard.db"))
}

fn parse_flag(value: Option<String>) -> bool {
    value
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse_number<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DASHDECK_STORE_PATH", "/tmp/deck.db"),
            ("DASHDECK_MAX_UPLOAD_BYTES", "1024"),
            ("DASHDECK_UPLOAD_LATENCY_MS", "0"),
            ("DASHDECK_DRAG_ACTIVATION_PX", "8.5"),
            ("DASHDECK_DEBUG", "true"),
        ])
        .unwrap();

        assert_eq!(config.store, StoreLocation::Sqlite(PathBuf::from("/tmp/deck.db")));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.upload_latency, Duration::ZERO);
        assert_eq!(config.drag_activation_distance, 8.5);
        assert!(config.debug);
    }

    #[test]
    fn test_memory_store_wins_over_path() {
        let config = config_from(&[
            ("DASHDECK_MEMORY_STORE", "1"),
            ("DASHDECK_STORE_PATH", "/tmp/deck.db"),
        ])
        .unwrap();

        assert_eq!(config.store, StoreLocation::Memory);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.upload_latency, DEFAULT_UPLOAD_LATENCY);
        assert!(!config.debug);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let err = config_from(&[
            ("DASHDECK_MEMORY_STORE", "1"),
            ("DASHDECK_MAX_UPLOAD_BYTES", "five"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "DASHDECK_MAX_UPLOAD_BYTES",
                ..
            }
        ));

        assert!(config_from(&[
            ("DASHDECK_MEMORY_STORE", "1"),
            ("DASHDECK_DRAG_ACTIVATION_PX", "-3"),
        ])
        .is_err());
    }
}
