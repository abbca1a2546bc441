use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Reconciliation failed for station {station}: {source}")]
    Reconciliation {
        station: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl SyncError {
    /// Wraps a store failure so the orchestrator can attribute it to a station.
    pub fn reconciliation(station: &str, source: SyncError) -> Self {
        SyncError::Reconciliation {
            station: station.to_string(),
            source: Box::new(source),
        }
    }

    /// True for failures that just mean "no update this cycle".
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SyncError::Fetch { .. } | SyncError::Parse(_) | SyncError::MissingField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
