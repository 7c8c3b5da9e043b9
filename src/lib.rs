pub mod browser;
pub mod cli;
pub mod config;
pub mod core;
pub mod modes;
pub mod tui;

pub use browser::{Browser, BrowserConfig};
pub use cli::args::*;
