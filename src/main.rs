use std::process::ExitCode;

use colored::Colorize;
use irio_gen::cli;

fn main() -> ExitCode {
    cli::init_tracing();
    let command_line_interface = cli::CommandLineInterface::load();
    match command_line_interface.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
