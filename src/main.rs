use nb::browser::{Browser, BrowserConfig, ColumnSettings, Services};
use nb::cli::{parse_args, print_help, Args};
use nb::config;
use nb::core::{
    FsNotebook, Handoff, JsonWorkspaceRegistry, RipgrepSearch, SystemEditor, TmuxMultiplexer,
};
use nb::modes::{run_browser, Foreground};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::process;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let parsed = parse_args(&args);

    if parsed.version {
        println!("{} {}", config::app_name(), env!("CARGO_PKG_VERSION"));
        return;
    }

    if parsed.help {
        print_help();
        return;
    }

    init_logging(parsed.verbose);

    let notebook_dir = parsed
        .notebook
        .as_deref()
        .map(config::expand_home)
        .unwrap_or_else(config::get_notebook_dir);
    tracing::info!(notebook = %notebook_dir.display(), "starting");

    let notebook = FsNotebook::new(&notebook_dir);
    let services = Services {
        workspaces: Arc::new(JsonWorkspaceRegistry::new(
            config::get_workspaces_path(),
            notebook.clone(),
        )),
        notes: Arc::new(notebook.clone()),
        service: Arc::new(notebook),
        search: Arc::new(RipgrepSearch::new()),
        multiplexer: Arc::new(TmuxMultiplexer::from_env()),
    };

    let handoff = Handoff::from_env();
    if let Some(handoff) = &handoff {
        tracing::info!(file = %handoff.path().display(), "hand-off enabled");
    }
    let browser = Browser::new(browser_config(&parsed, handoff.is_some()));
    let foreground = Foreground {
        editor: Box::new(SystemEditor::from_env()),
        handoff,
        watch_dir: notebook_dir.is_dir().then_some(notebook_dir),
    };

    if let Err(message) = run_browser(browser, services, foreground) {
        tracing::error!("{message}");
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

fn browser_config(args: &Args, handoff: bool) -> BrowserConfig {
    let columns_path = config::get_columns_path();
    BrowserConfig {
        focus: args.focus.as_deref().map(resolve_focus),
        ecosystem_picker: args.ecosystems,
        show_archives: args.archives,
        hide_global: args.hide_global,
        sort_ascending: args.ascending,
        table_view: args.table,
        handoff,
        embedded: args.embedded,
        columns: ColumnSettings::load(&columns_path),
        columns_path,
    }
}

/// A focus argument naming an existing directory becomes its absolute path;
/// anything else is looked up as a workspace name.
fn resolve_focus(value: &str) -> String {
    let path = config::expand_home(value);
    if path.is_dir() {
        if let Ok(absolute) = fs::canonicalize(&path) {
            return absolute.display().to_string();
        }
    }
    value.to_string()
}

/// Logs go to a file; the terminal belongs to the browser.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "nb=debug" } else { "nb=info" };
    let filter = EnvFilter::try_from_env(config::ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_path = config::get_log_path();
    match open_log(&log_path) {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
        }
        Err(err) => {
            eprintln!("Warning: cannot open {}: {err}", log_path.display());
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn open_log(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
