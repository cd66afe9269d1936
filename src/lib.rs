pub mod cli_app;
pub mod command_logic;
pub mod config;
pub mod constants;
pub mod external_api;
pub mod utils;
pub mod view;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log to stderr; stdout carries the rendered frames.
///
/// Verbosity: 0 = warn, 1 = info, 2 = debug, 3+ = trace. `RUST_LOG` is honoured too.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = match format!("tagview={}", level).parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
