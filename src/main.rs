// dbinventory — Application Entry Point
//
// Parses CLI arguments, initializes structured logging on stderr (stdout
// carries the inventory JSON that Ansible reads), and dispatches to the
// command handler.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dbinventory::cli::{Cli, execute};

fn main() {
    // RUST_LOG=dbinventory=debug for verbose output. Credential values are
    // never logged at any level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dbinventory=warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
