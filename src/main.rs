mod cli;
mod config;
mod error;
mod logging;
mod resolve;
mod runner;
mod writer;

use std::process::ExitCode;

/// Every failure exits with the same status.
const FAILURE: u8 = 2;

fn main() -> ExitCode {
    let app = cli::parse();
    logging::init(app.verbose);
    match runner::run(app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(FAILURE)
        }
    }
}
