pub mod args;

pub use args::{parse_args, print_help, Args};
