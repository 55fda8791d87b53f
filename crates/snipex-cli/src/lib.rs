pub mod cli;
pub mod commands;
pub mod logging;
pub mod store;

use clap::Parser;
use cli::Snipex;
use commands::handle_command;
use std::process;

/// Run the snipex CLI application
pub fn run_main() {
    let args = Snipex::parse();
    logging::init(args.verbose);

    if let Err(e) = handle_command(args.commands) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
