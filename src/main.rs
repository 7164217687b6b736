//! codenav CLI entry point.

use clap::Parser;
use codenav::cli::{self, Cli, EXIT_ERROR};
use codenav::report;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `codenav=debug`.
const LOG_ENV: &str = "CODENAV_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            if cli.json {
                println!("{}", report::error_json(&e.to_string()));
            } else {
                eprintln!("Error: {}", e);
            }
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
