use clap::Parser;
use folderfix::cli::{Args, run_cli};
use folderfix::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    match run_cli(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}
