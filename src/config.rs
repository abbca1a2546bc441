use crate::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use crate::error::{Result, SyncError};
use crate::types::Station;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("station_sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub snapshot_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("data/store.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Resolve the config path: explicit argument, then `STATION_SYNC_CONFIG`,
    /// then `config.toml`.
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(PathBuf::from(DEFAULT_CONFIG_PATH)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            SyncError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for station in &self.stations {
            if station.name.trim().is_empty() {
                return Err(SyncError::Config("Station with empty name".to_string()));
            }
            if !names.insert(station.name.as_str()) {
                return Err(SyncError::Config(format!(
                    "Station '{}' is configured more than once",
                    station.name
                )));
            }
            if let Some(source) = &station.schedule {
                if source.url().trim().is_empty() {
                    return Err(SyncError::Config(format!(
                        "Station '{}' has an empty schedule URL",
                        station.name
                    )));
                }
            }
            if let Some(source) = &station.presenters {
                if source.url().trim().is_empty() {
                    return Err(SyncError::Config(format!(
                        "Station '{}' has an empty presenter list URL",
                        station.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stations to process: all of them, or those named in `only`.
    pub fn select_stations(&self, only: Option<&[String]>) -> Result<Vec<Station>> {
        let Some(names) = only else {
            return Ok(self.stations.clone());
        };

        names
            .iter()
            .map(|name| {
                self.stations
                    .iter()
                    .find(|station| &station.name == name)
                    .cloned()
                    .ok_or_else(|| SyncError::Config(format!("Unknown station '{}'", name)))
            })
            .collect()
    }
}
