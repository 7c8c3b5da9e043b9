pub mod interactive;
pub mod watch;

pub use interactive::{run_browser, Foreground};
pub use watch::{watch_notebook, NotebookWatcher};
