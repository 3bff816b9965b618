use hubfetch_core::logging;
use std::process::ExitCode;

mod cli;

use crate::cli::Cli;

fn main() -> ExitCode {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    match Cli::run_from_args() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("hubfetch error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
