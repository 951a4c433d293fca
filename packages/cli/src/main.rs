mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, inspect, preview, validate, InitArgs, InspectArgs, PreviewArgs, ValidateArgs};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FORMWORK_LOG";

/// Formwork CLI - inspect, validate and preview form definitions
#[derive(Parser, Debug)]
#[command(name = "formwork")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a config file and a starter form
    Init(InitArgs),

    /// Print the field tree of a form
    Inspect(InspectArgs),

    /// Check one form file or every form under a directory
    Validate(ValidateArgs),

    /// Evaluate visibility rules against a set of values
    Preview(PreviewArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Validate(args) => validate(args, &cwd),
        Command::Preview(args) => preview(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
