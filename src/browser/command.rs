//! Background work requested by the browser and the messages it posts back.

use crate::browser::columns::ColumnSettings;
use crate::browser::selection::{ClipboardMode, PlanGroupKey};
use crate::core::errors::BatchError;
use crate::core::launch::HandoffKind;
use crate::core::model::{Note, WorkspaceNode, GLOBAL_WORKSPACE, PLANS_GROUP};
use crate::core::sources::{
    ContentSearch, NoteService, NoteSource, Placement, TerminalMultiplexer, WorkspaceSource,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

/// A plan to archive together with the notes it currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanArchive {
    pub key: PlanGroupKey,
    pub notes: Vec<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    LoadData {
        generation: u64,
        focus: Option<WorkspaceNode>,
        include_archived: bool,
    },
    Archive {
        notes: Vec<PathBuf>,
        plans: Vec<PlanArchive>,
    },
    Delete {
        notes: Vec<PathBuf>,
    },
    Rename {
        path: PathBuf,
        title: String,
    },
    Create {
        placement: Placement,
        note_type: String,
        title: String,
    },
    Paste {
        paths: Vec<PathBuf>,
        mode: ClipboardMode,
        dest: Placement,
    },
    Grep {
        query: String,
        workspaces: Vec<WorkspaceNode>,
    },
    OpenSplit {
        path: PathBuf,
    },
    SaveColumns {
        settings: ColumnSettings,
        path: PathBuf,
    },
    /// Runs on the event-loop thread with the terminal released.
    OpenEditor {
        path: PathBuf,
    },
    /// Runs on the event-loop thread.
    Handoff {
        path: PathBuf,
        kind: HandoffKind,
    },
    Quit,
}

impl Command {
    /// Commands the event loop must run itself.
    pub fn is_foreground(&self) -> bool {
        matches!(
            self,
            Command::OpenEditor { .. } | Command::Handoff { .. } | Command::Quit
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Archive,
    Delete,
    Rename,
    Create,
    Paste(ClipboardMode),
}

/// Result of a note mutation. `completed` lists what succeeded before the
/// first failure: source paths for archive and delete, new paths otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    pub completed: Vec<PathBuf>,
    pub error: Option<String>,
}

impl MutationOutcome {
    pub fn ok(completed: Vec<PathBuf>) -> Self {
        Self {
            completed,
            error: None,
        }
    }

    pub fn failed(completed: Vec<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            completed,
            error: Some(error.into()),
        }
    }
}

impl From<BatchError> for MutationOutcome {
    fn from(err: BatchError) -> Self {
        let error = err.source.to_string();
        Self::failed(err.completed, error)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    DataLoaded {
        generation: u64,
        workspaces: Vec<WorkspaceNode>,
        notes: Vec<Note>,
        errors: Vec<String>,
    },
    Mutated {
        mutation: Mutation,
        outcome: MutationOutcome,
    },
    GrepResults {
        query: String,
        result: Result<Vec<PathBuf>, String>,
    },
    SplitFailed {
        path: PathBuf,
        error: String,
    },
    EditorClosed {
        result: Result<(), String>,
    },
    ColumnsSaved {
        result: Result<(), String>,
    },
    ExternalChange,
}

/// Collaborators the runner's worker threads share.
#[derive(Clone)]
pub struct Services {
    pub workspaces: Arc<dyn WorkspaceSource>,
    pub notes: Arc<dyn NoteSource>,
    pub service: Arc<dyn NoteService>,
    pub search: Arc<dyn ContentSearch>,
    pub multiplexer: Arc<dyn TerminalMultiplexer>,
}

/// Runs each background command on its own short-lived thread and posts the
/// result to the event loop. Commands are never cancelled.
pub struct AsyncCommandRunner {
    services: Services,
    tx: Sender<Message>,
}

impl AsyncCommandRunner {
    pub fn new(services: Services, tx: Sender<Message>) -> Self {
        Self { services, tx }
    }

    pub fn spawn(&self, command: Command) {
        if command.is_foreground() {
            tracing::warn!(?command, "foreground command sent to the runner");
            return;
        }
        let services = self.services.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            if let Some(message) = execute(&services, command) {
                let _ = tx.send(message);
            }
        });
    }
}

/// Executes one background command synchronously.
pub fn execute(services: &Services, command: Command) -> Option<Message> {
    tracing::debug!(?command, "executing");
    let message = match command {
        Command::LoadData {
            generation,
            focus,
            include_archived,
        } => {
            let (workspaces, notes, errors) =
                load_snapshot(services, focus.as_ref(), include_archived);
            Message::DataLoaded {
                generation,
                workspaces,
                notes,
                errors,
            }
        }
        Command::Archive { notes, plans } => Message::Mutated {
            mutation: Mutation::Archive,
            outcome: archive(services.service.as_ref(), &notes, &plans),
        },
        Command::Delete { notes } => Message::Mutated {
            mutation: Mutation::Delete,
            outcome: match services.service.delete_notes(&notes) {
                Ok(()) => MutationOutcome::ok(notes),
                Err(err) => err.into(),
            },
        },
        Command::Rename { path, title } => Message::Mutated {
            mutation: Mutation::Rename,
            outcome: match services.service.rename_note(&path, &title) {
                Ok(new_path) => MutationOutcome::ok(vec![new_path]),
                Err(err) => MutationOutcome::failed(Vec::new(), err.to_string()),
            },
        },
        Command::Create {
            placement,
            note_type,
            title,
        } => Message::Mutated {
            mutation: Mutation::Create,
            outcome: match services.service.create_note(&placement, &note_type, &title) {
                Ok(note) => MutationOutcome::ok(vec![note.path]),
                Err(err) => MutationOutcome::failed(Vec::new(), err.to_string()),
            },
        },
        Command::Paste { paths, mode, dest } => {
            let result = match mode {
                ClipboardMode::Cut => services.service.move_notes(&paths, &dest),
                ClipboardMode::Copy => services.service.copy_notes(&paths, &dest),
            };
            Message::Mutated {
                mutation: Mutation::Paste(mode),
                outcome: match result {
                    Ok(paths) => MutationOutcome::ok(paths),
                    Err(err) => err.into(),
                },
            }
        }
        Command::Grep { query, workspaces } => {
            let dirs = services.notes.note_dirs(&workspaces);
            let result = services
                .search
                .grep(&query, &dirs)
                .map_err(|err| err.to_string());
            Message::GrepResults { query, result }
        }
        Command::OpenSplit { path } => match services.multiplexer.split_and_open(&path) {
            Ok(()) => return None,
            Err(err) => Message::SplitFailed {
                path,
                error: err.to_string(),
            },
        },
        Command::SaveColumns { settings, path } => Message::ColumnsSaved {
            result: settings.save(&path).map_err(|err| err.to_string()),
        },
        Command::OpenEditor { .. } | Command::Handoff { .. } | Command::Quit => return None,
    };
    Some(message)
}

/// Workspaces plus the notes visible to `focus`. Failures degrade to empty
/// lists and are reported alongside the data.
pub fn load_snapshot(
    services: &Services,
    focus: Option<&WorkspaceNode>,
    include_archived: bool,
) -> (Vec<WorkspaceNode>, Vec<Note>, Vec<String>) {
    let mut errors = Vec::new();
    let workspaces = services.workspaces.all().unwrap_or_else(|err| {
        tracing::warn!("workspace registry unavailable: {err}");
        errors.push(err.to_string());
        Vec::new()
    });

    let mut notes = services
        .notes
        .list_global_items(include_archived, false)
        .unwrap_or_else(|err| {
            errors.push(err.to_string());
            Vec::new()
        });

    let in_scope = |ws: &&WorkspaceNode| match focus {
        Some(focus) if focus.is_global() => false,
        Some(focus) if ws.path == focus.path => true,
        Some(focus) => !ws.kind.is_worktree() && ws.is_descendant_of(focus),
        None => !ws.kind.is_worktree(),
    };
    // Notes are stored per workspace name; list each name once.
    let mut listed = HashSet::new();
    for ws in workspaces
        .iter()
        .filter(|ws| ws.name != GLOBAL_WORKSPACE)
        .filter(in_scope)
        .filter(|ws| listed.insert(ws.name.as_str()))
    {
        match services.notes.list_all_items(ws, include_archived, false) {
            Ok(items) => notes.extend(items),
            Err(err) => {
                tracing::warn!(workspace = %ws.name, "failed to list notes: {err}");
                errors.push(format!("{}: {err}", ws.name));
            }
        }
    }
    (workspaces, notes, errors)
}

fn archive(service: &dyn NoteService, notes: &[PathBuf], plans: &[PlanArchive]) -> MutationOutcome {
    let mut completed = if notes.is_empty() {
        Vec::new()
    } else {
        match service.archive_notes(notes) {
            Ok(paths) => paths,
            Err(err) => return err.into(),
        }
    };
    for plan in plans {
        let workspace = Some(plan.key.workspace.as_str()).filter(|ws| *ws != GLOBAL_WORKSPACE);
        let name = plan_name(&plan.key.group);
        match service.archive_plan(workspace, name) {
            Ok(dir) => {
                tracing::info!(plan = %plan.key.group, dest = %dir.display(), "archived plan");
                completed.extend(plan.notes.iter().cloned());
            }
            Err(err) => return MutationOutcome::failed(completed, err.to_string()),
        }
    }
    MutationOutcome::ok(completed)
}

fn plan_name(group: &str) -> &str {
    group
        .strip_prefix(PLANS_GROUP)
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or(group)
}
