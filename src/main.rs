use clap::Parser;
use modelrun::cli::{execute, Cli};
use std::io;

fn main() {
    modelrun::init_logging();
    let cli = Cli::parse();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout().lock();
    if let Err(e) = execute(cli, &mut input, &mut output) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
