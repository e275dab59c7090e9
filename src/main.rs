//! pave - plugin build tasks

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = plugin_pave::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
