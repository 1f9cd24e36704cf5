//! Error types for the case study player.

use caselab_core::{RemoteError, SessionError};

/// Errors that can occur while playing a case study.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The command line could not be understood.
    #[error("usage: caselab-player <case-file.yaml> [simulation-id] ({0})")]
    Usage(String),

    /// The case file could not be read or is inconsistent.
    #[error("case file error: {0}")]
    CaseFile(String),

    /// Failed to load or render a template.
    #[error("template render error: {0}")]
    Template(String),

    /// The state resource refused or failed a request.
    #[error("state resource error: {0}")]
    Remote(#[from] RemoteError),

    /// The session could not be opened.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Terminal input or output failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}
