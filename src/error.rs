use thiserror::Error;

/// Failures reading from the match store. A missing match is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("match store unavailable: {0}")]
    Connectivity(String),
    #[error("stored match document {doc_id} is unreadable: {reason}")]
    Decode { doc_id: i64, reason: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Connectivity(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no stored match for {home} vs {away}")]
    NotFound { home: String, away: String },
    #[error("match document has an unexpected shape: {0}")]
    DataShape(String),
    #[error("{0}")]
    Connectivity(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DataShape,
    Connectivity,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NotFound { .. } => ErrorKind::NotFound,
            PipelineError::DataShape(_) => ErrorKind::DataShape,
            PipelineError::Connectivity(_) => ErrorKind::Connectivity,
        }
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        PipelineError::DataShape(msg.into())
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connectivity(msg) => PipelineError::Connectivity(msg),
            // A stored body we cannot decode is a shape problem, not an outage.
            StoreError::Decode { .. } => PipelineError::DataShape(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} needs a value")]
    MissingValue(&'static str),
}
