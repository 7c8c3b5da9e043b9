use crate::core::errors::{NotebookError, SearchError};
use crate::core::sources::ContentSearch;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Content search backed by ripgrep. When `rg` cannot be spawned the search
/// falls back to a literal, case-insensitive scan of markdown files.
pub struct RipgrepSearch {
    program: String,
}

impl RipgrepSearch {
    pub fn new() -> Self {
        Self {
            program: "rg".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run_rg(&self, query: &str, dirs: &[PathBuf]) -> Result<Vec<PathBuf>, SearchError> {
        let output = Command::new(&self.program)
            .args([
                "--files-with-matches",
                "--ignore-case",
                "--fixed-strings",
                "--hidden",
                "--glob",
                "*.md",
                "--",
                query,
            ])
            .args(dirs)
            .output()
            .map_err(SearchError::Spawn)?;

        // rg exits 1 when nothing matched.
        match output.status.code() {
            Some(0) | Some(1) => {}
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(SearchError::Failed(stderr.trim().to_string()));
            }
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

impl Default for RipgrepSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSearch for RipgrepSearch {
    fn grep(&self, query: &str, dirs: &[PathBuf]) -> Result<Vec<PathBuf>, SearchError> {
        if query.trim().is_empty() || dirs.is_empty() {
            return Ok(Vec::new());
        }
        match self.run_rg(query, dirs) {
            Err(SearchError::Spawn(err)) if err.kind() == ErrorKind::NotFound => {
                tracing::info!("{} not found, scanning notes in-process", self.program);
                scan_dirs(query, dirs)
            }
            other => other,
        }
    }
}

/// In-process fallback: literal, case-insensitive match over `*.md` files.
pub fn scan_dirs(query: &str, dirs: &[PathBuf]) -> Result<Vec<PathBuf>, SearchError> {
    let needle = query.to_lowercase();
    let mut hits = Vec::new();
    for dir in dirs {
        let pattern = format!("{}/**/*.md", glob::Pattern::escape(&dir.to_string_lossy()));
        for path in glob::glob(&pattern).map_err(NotebookError::from)?.flatten() {
            if file_contains(&path, &needle) {
                hits.push(path);
            }
        }
    }
    Ok(hits)
}

fn file_contains(path: &Path, needle: &str) -> bool {
    fs::read_to_string(path)
        .map(|content| content.to_lowercase().contains(needle))
        .unwrap_or(false)
}
