//! Error types shared by the collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the notebook store and the workspace registry.
#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("note not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unknown workspace `{0}`")]
    UnknownWorkspace(String),

    #[error("invalid group `{0}`")]
    InvalidGroup(String),

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid workspace registry {}: {source}", .path.display())]
    Registry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("bad glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl NotebookError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A multi-file operation that stopped at its first failure. Work already
/// done is not rolled back; `completed` lists what succeeded.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct BatchError {
    pub completed: Vec<PathBuf>,
    #[source]
    pub source: NotebookError,
}

impl BatchError {
    pub fn new(completed: Vec<PathBuf>, source: NotebookError) -> Self {
        Self { completed, source }
    }
}

/// Editor and multiplexer launch failures.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },

    #[error("failed to write hand-off file {}: {source}", .path.display())]
    Handoff {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Content search failures.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("failed to run rg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("rg failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Notebook(#[from] NotebookError),
}

pub type NotebookResult<T> = Result<T, NotebookError>;
pub type BatchResult<T> = Result<T, BatchError>;
