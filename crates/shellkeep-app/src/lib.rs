pub mod app;
pub mod cli;
pub mod logging;
pub mod repl;

pub use app::{run, App, CommandFailed};
pub use cli::{Cli, Commands};
pub use logging::init_logging;
