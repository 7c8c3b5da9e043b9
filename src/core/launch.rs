//! Editor, terminal multiplexer, and editor hand-off integration.

use crate::config;
use crate::core::errors::LaunchError;
use crate::core::sources::{EditorLauncher, TerminalMultiplexer};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

const FALLBACK_EDITOR: &str = "vi";

/// Resolves the editor command line from `$VISUAL`, then `$EDITOR`.
pub fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|key| env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Foreground editor. Blocks until the editor exits.
pub struct SystemEditor {
    command: String,
}

impl SystemEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(editor_command())
    }
}

impl EditorLauncher for SystemEditor {
    fn open(&self, path: &Path) -> Result<(), LaunchError> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().unwrap_or(FALLBACK_EDITOR);
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => LaunchError::Unavailable("editor"),
                _ => LaunchError::Spawn {
                    program: program.to_string(),
                    source,
                },
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::Exit {
                program: program.to_string(),
                status: status.to_string(),
            })
        }
    }
}

/// Opens notes in a new tmux pane beside the browser.
pub struct TmuxMultiplexer {
    editor: String,
}

impl TmuxMultiplexer {
    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(editor_command())
    }
}

impl TerminalMultiplexer for TmuxMultiplexer {
    fn is_available(&self) -> bool {
        env::var(config::ENV_TMUX)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }

    fn split_and_open(&self, path: &Path) -> Result<(), LaunchError> {
        if !self.is_available() {
            return Err(LaunchError::Unavailable("tmux"));
        }
        let shell_command = format!("{} {}", self.editor, shell_quote(&path.to_string_lossy()));
        let output = Command::new("tmux")
            .args(["split-window", "-h", &shell_command])
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => LaunchError::Unavailable("tmux"),
                _ => LaunchError::Spawn {
                    program: "tmux".to_string(),
                    source,
                },
            })?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            Err(LaunchError::Exit {
                program: "tmux".to_string(),
                status: if message.is_empty() {
                    output.status.to_string()
                } else {
                    message.to_string()
                },
            })
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandoffKind {
    Open,
    Preview,
}

impl HandoffKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Preview => "PREVIEW",
        }
    }
}

/// Plaintext file an embedding editor watches for `OPEN:`/`PREVIEW:` lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handoff {
    path: PathBuf,
}

impl Handoff {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Enabled by `NB_HANDOFF`; the file defaults to a per-user temp file
    /// and is overridden by `NB_HANDOFF_FILE`.
    pub fn from_env() -> Option<Self> {
        let enabled = env::var(config::ENV_HANDOFF)
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        enabled.then(|| Self::new(config::handoff_file_path()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the hand-off file with a single line for `note`.
    pub fn write(&self, kind: HandoffKind, note: &Path) -> Result<(), LaunchError> {
        let absolute = if note.is_absolute() {
            note.to_path_buf()
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(note))
                .unwrap_or_else(|_| note.to_path_buf())
        };
        let line = format!("{}:{}\n", kind.tag(), absolute.display());
        fs::write(&self.path, line).map_err(|source| LaunchError::Handoff {
            path: self.path.clone(),
            source,
        })
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_single_quotes() {
        assert_eq!(shell_quote("a'b"), "'a'\\''b'");
    }

    #[test]
    fn handoff_writes_one_tagged_line() {
        let path = env::temp_dir().join(format!("nb-handoff-{}.txt", uuid::Uuid::new_v4()));
        let handoff = Handoff::new(&path);
        handoff
            .write(HandoffKind::Preview, Path::new("/notes/a.md"))
            .unwrap();
        handoff.write(HandoffKind::Open, Path::new("/notes/b.md")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "OPEN:/notes/b.md\n");
        let _ = fs::remove_file(&path);
    }
}
