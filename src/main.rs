use clap::Parser;
use std::process;
use uataq_fs::cli::{self, Args};

fn main() {
    let args = Args::parse();

    if let Err(e) = cli::setup_logging(&args) {
        eprintln!("Failed to set up logging: {:#}", e);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(cli::run(args));

    if let Err(error) = result {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}
