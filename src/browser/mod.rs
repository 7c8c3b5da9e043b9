//! Browser model: tree building, folding, filtering, selection and the
//! modal key handling that ties them together.

pub mod columns;
pub mod command;
pub mod filter;
pub mod fold;
pub mod keyseq;
pub mod node;
pub mod selection;
pub mod state;
pub mod tree;

pub use columns::{Column, ColumnSettings};
pub use command::{
    execute, load_snapshot, AsyncCommandRunner, Command, Message, Mutation, MutationOutcome,
    PlanArchive, Services,
};
pub use fold::FoldState;
pub use keyseq::{KeySequence, Step};
pub use node::{DisplayNode, NodeId, NodeKind};
pub use selection::{Clipboard, ClipboardMode, PlanGroupKey, SelectionStore};
pub use state::{
    ActiveFilter, Browser, BrowserConfig, CreatePlacement, CreateStep, Mode, Status, NOTE_TYPES,
};
pub use tree::{build_tree, filter_tree, TreeBuild, TreeOptions, UNGROUPED_LABEL};
