use clap::Parser;
use std::process::ExitCode;
use tagview::cli_app::{handle_command, Cli};
use tagview::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start the runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(handle_command(cli));
    // the stdin reader may still be parked on a blocking read
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
