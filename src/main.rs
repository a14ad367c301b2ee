//! rptbatch CLI entrypoint.
//!
//! Thin wrapper over the `cli` module: resolve the configuration, run every
//! report in the job table, and exit non-zero only when the run could not start.
//! For programmatic use, prefer the library API (`rptbatch::api`).

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rptbatch: {e}");
            ExitCode::FAILURE
        }
    }
}
