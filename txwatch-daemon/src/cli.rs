use clap::{Parser, Subcommand};

/// The main CLI structure for the txwatch daemon.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Defines the available subcommands for the application.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scanner.
    /// This starts the block poller and the periodic report of watched addresses.
    Run(RunCmd),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to the configuration TOML file.
    /// If not provided, default values will be used.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Additional address to watch, on top of those in the configuration. Repeatable.
    #[arg(short, long = "watch", value_name = "ADDRESS")]
    pub watch: Vec<String>,
}
