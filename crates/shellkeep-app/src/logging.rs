use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "shellkeep=debug,shellkeep_terminal=debug,shellkeep_tools=debug,warn"
    } else {
        "warn"
    }
}

/// Initialize diagnostics on stderr so stdout carries only command output.
///
/// `RUST_LOG` wins over the verbosity flag. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
        .ok();
}
