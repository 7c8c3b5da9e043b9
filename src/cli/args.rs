#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub help: bool,
    pub version: bool,
    /// Workspace name or path to focus on.
    pub focus: Option<String>,
    /// Start in the ecosystem picker.
    pub ecosystems: bool,
    pub archives: bool,
    pub hide_global: bool,
    pub ascending: bool,
    pub table: bool,
    pub notebook: Option<String>,
    /// Quit after handing a note to the embedding editor.
    pub embedded: bool,
    pub verbose: bool,
    pub unknown: Vec<String>,
}

pub fn parse_args(args: &[String]) -> Args {
    let mut result = Args::default();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();

        match arg {
            "--help" | "-h" => {
                result.help = true;
            }
            "--version" | "-v" => {
                result.version = true;
            }
            "--focus" | "-f" if i + 1 < args.len() => {
                result.focus = Some(args[i + 1].clone());
                i += 1;
            }
            "--notebook" if i + 1 < args.len() => {
                result.notebook = Some(args[i + 1].clone());
                i += 1;
            }
            "--focus" | "-f" | "--notebook" => {
                eprintln!("Warning: {arg} needs a value");
            }
            "--ecosystems" => {
                result.ecosystems = true;
            }
            "--archives" => {
                result.archives = true;
            }
            "--hide-global" => {
                result.hide_global = true;
            }
            "--ascending" => {
                result.ascending = true;
            }
            "--table" => {
                result.table = true;
            }
            "--embedded" => {
                result.embedded = true;
            }
            "--verbose" => {
                result.verbose = true;
            }
            _ if arg.starts_with("--focus=") => {
                result.focus = Some(arg.trim_start_matches("--focus=").to_string());
            }
            _ if arg.starts_with("--notebook=") => {
                result.notebook = Some(arg.trim_start_matches("--notebook=").to_string());
            }
            _ if !arg.starts_with('-') && result.focus.is_none() => {
                result.focus = Some(arg.to_string());
            }
            _ => {
                eprintln!("Warning: ignoring unknown argument \"{arg}\"");
                result.unknown.push(arg.to_string());
            }
        }

        i += 1;
    }

    result
}

pub fn print_help() {
    println!(
        "nb - browse notes across workspaces

Usage:
  nb [options] [workspace]

Options:
  --help, -h            Show this help
  --version, -v         Show version
  --focus, -f <ws>      Focus a workspace by name or path
  --ecosystems          Start in the ecosystem picker
  --archives            Show archived notes
  --hide-global         Hide the global workspace
  --ascending           Oldest notes first
  --table               Start in table view
  --notebook <dir>      Notebook root (default: $NB_NOTEBOOK_DIR or ~/notebook)
  --embedded            Quit after handing a note to the embedding editor
  --verbose             Debug logging to ~/.nb/nb.log

Environment:
  NB_DIR                Config directory (default: ~/.nb)
  NB_HANDOFF            Write opened notes to a hand-off file instead of
                        launching $EDITOR
  NB_HANDOFF_FILE       Hand-off file path
  NB_LOG                Log filter, e.g. nb=debug

Press ? inside the browser for key bindings."
    );
}
