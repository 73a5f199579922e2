use std::process::ExitCode;

use clap::Parser;

use swankypaint::cli::{self, CliArgs};
use swankypaint::logger;

fn main() -> ExitCode {
    logger::init();
    let args = CliArgs::parse();
    swankypaint::log_info!("CLI run over {} input pattern(s)", args.input.len());
    cli::run(args)
}
