use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const ENV_CONFIG_DIR: &str = "NB_DIR";
pub const ENV_NOTEBOOK_DIR: &str = "NB_NOTEBOOK_DIR";
pub const ENV_HANDOFF: &str = "NB_HANDOFF";
pub const ENV_HANDOFF_FILE: &str = "NB_HANDOFF_FILE";
pub const ENV_TMUX: &str = "TMUX";
pub const ENV_LOG: &str = "NB_LOG";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub app_name: String,
    pub config_dir: PathBuf,
    pub notebook_dir: PathBuf,
}

impl AppConfig {
    fn new(config_dir: PathBuf, notebook_dir: PathBuf) -> Self {
        Self {
            app_name: "nb".to_string(),
            config_dir,
            notebook_dir,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(home_dir().join(".nb"), home_dir().join("notebook"))
    }
}

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

pub fn app_config() -> &'static AppConfig {
    APP_CONFIG.get_or_init(load_app_config)
}

pub fn app_name() -> &'static str {
    &app_config().app_name
}

pub fn get_config_dir() -> PathBuf {
    app_config().config_dir.clone()
}

pub fn get_notebook_dir() -> PathBuf {
    app_config().notebook_dir.clone()
}

pub fn get_columns_path() -> PathBuf {
    get_config_dir().join("columns.json")
}

pub fn get_workspaces_path() -> PathBuf {
    get_config_dir().join("workspaces.json")
}

pub fn get_log_path() -> PathBuf {
    get_config_dir().join("nb.log")
}

/// `NB_HANDOFF_FILE`, or a per-user file in the temp directory.
pub fn handoff_file_path() -> PathBuf {
    env_path(ENV_HANDOFF_FILE).unwrap_or_else(|| {
        let user = env::var("USER").unwrap_or_else(|_| "default".to_string());
        env::temp_dir().join(format!("nb-handoff-{user}.txt"))
    })
}

/// Reads `config.json` from a config directory. Only `notebookDir` is
/// recognized; a relative value resolves against the config directory.
pub fn app_config_from_file(config_dir: &Path) -> Option<AppConfig> {
    let content = fs::read_to_string(config_dir.join("config.json")).ok()?;
    let value: Value = serde_json::from_str(&content).ok()?;
    let notebook_dir = value
        .get("notebookDir")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(expand_home)
        .map(|dir| {
            if dir.is_absolute() {
                dir
            } else {
                config_dir.join(dir)
            }
        })?;
    Some(AppConfig::new(config_dir.to_path_buf(), notebook_dir))
}

fn load_app_config() -> AppConfig {
    let config_dir = env_path(ENV_CONFIG_DIR).unwrap_or_else(|| home_dir().join(".nb"));
    let mut config = app_config_from_file(&config_dir)
        .unwrap_or_else(|| AppConfig::new(config_dir, home_dir().join("notebook")));
    if let Some(dir) = env_path(ENV_NOTEBOOK_DIR) {
        config.notebook_dir = dir;
    }
    config
}

fn env_path(key: &str) -> Option<PathBuf> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(expand_home(trimmed))
    }
}

pub fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if value == "~" => home_dir(),
        None => PathBuf::from(value),
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
