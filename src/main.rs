use clap::Parser;
use roster::cli::{run_cli, Cli};
use roster::telemetry::{init_logging, LogConfig};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("warning: {e:#}");
    }

    if let Err(e) = run_cli(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
