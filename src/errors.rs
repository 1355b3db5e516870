use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single diagnosis round-trip. All of them are recoverable:
/// the wizard stays on the contact step and the user may resubmit.
#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("provider error: {0}")]
    Upstream(String),
    #[error("provider returned an empty response")]
    Empty,
    #[error("response is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("response does not match the diagnosis schema: {0}")]
    Schema(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("cannot write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
    #[error("locale '{lang}' is invalid: {message}")]
    Locale { lang: String, message: String },
    #[error("device catalog is invalid: {0}")]
    Devices(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("invalid service type: {0}")]
    InvalidServiceType(String),
}
