#![forbid(unsafe_code)]

//! ssw — sample sweeper CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    let code = match cli_app::run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ssw: {e}");
            cli_app::EXIT_ERROR
        }
    };
    std::process::exit(code);
}
