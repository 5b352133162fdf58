use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a browser session or one of its elements.
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    /// The locator resolved to no element
    #[error("no element matches {selector}")]
    NoSuchElement { selector: String },

    /// The engine rejected the locator itself (malformed XPath/CSS)
    #[error("{message}")]
    InvalidSelector { selector: String, message: String },

    /// A bounded wait expired
    #[error("waiting for {selector} timed out after {timeout_ms}ms")]
    Timeout { selector: String, timeout_ms: u64 },

    /// Any other command the endpoint refused or could not complete
    #[error("browser command failed: {0}")]
    Command(String),

    /// The remote session is gone; nothing further can run on it
    #[error("browser session lost: {0}")]
    SessionLost(String),

    /// A session could not be established with the hub
    #[error("could not connect to {0}")]
    Connect(String),
}

impl BrowserError {
    /// Whether this error means the session can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowserError::SessionLost(_) | BrowserError::Connect(_))
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Failures that stop a step, a case, a viewport pass or the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("test specification not found: {}", .0.display())]
    SpecNotFound(PathBuf),

    #[error("could not parse {}: {message}", path.display())]
    SpecParse { path: PathBuf, message: String },

    #[error("{kind} name {name:?} must be a single path component")]
    UnsafeName { kind: &'static str, name: String },

    #[error("browser session could not be built: {0}")]
    SessionBuild(#[source] BrowserError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("could not serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RunError {
    /// Whether the browser session is gone and nothing else can run on it.
    pub fn is_fatal(&self) -> bool {
        match self {
            RunError::Browser(e) | RunError::SessionBuild(e) => e.is_fatal(),
            _ => false,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}
