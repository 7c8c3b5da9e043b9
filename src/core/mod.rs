pub mod errors;
pub mod frontmatter;
pub mod launch;
pub mod model;
pub mod notebook;
pub mod registry;
pub mod search;
pub mod sources;

pub use errors::{BatchError, LaunchError, NotebookError, SearchError};
pub use launch::{Handoff, HandoffKind, SystemEditor, TmuxMultiplexer};
pub use model::{Note, WorkspaceKind, WorkspaceNode};
pub use notebook::FsNotebook;
pub use registry::JsonWorkspaceRegistry;
pub use search::RipgrepSearch;
pub use sources::{
    ContentSearch, EditorLauncher, NoteService, NoteSource, Placement, TerminalMultiplexer,
    WorkspaceSource,
};
