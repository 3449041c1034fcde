use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the process before the simulation loop starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("datacenters file {path:?} could not be read: {source}")]
    DatacentersUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("players file {path:?} could not be read: {source}")]
    PlayersUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("latency grid {path:?} has {observed} bytes, expected {expected}")]
    GridSizeMismatch {
        path: PathBuf,
        observed: u64,
        expected: u64,
    },

    #[error("no datacenters loaded from {path:?}")]
    NoDatacenters { path: PathBuf },

    #[error("failed to bind HTTP listener on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid HTTP bind address {addr:?}")]
    InvalidBindAddress { addr: String },

    #[error("config file {path:?} is not valid JSON: {source}")]
    ConfigFileInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path:?} could not be read: {source}")]
    PathUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors absorbed at steady state; never abort the tick loop. Constructed
/// at the CSV row-skip and CSV/density publish call sites so those
/// `tracing::warn!` lines carry a typed value instead of an ad hoc string.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("malformed row in {file}: {line}")]
    MalformedRow { file: String, line: String },

    #[error("density publish failed: {0}")]
    PublishFailed(String),
}
