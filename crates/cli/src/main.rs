mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::{cmd_build, cmd_deps};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// btrpsl placement script compiler.
#[derive(Parser)]
#[command(name = "btrpsl", version, about = "btrpsl placement script compiler")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a .btrp script and report its content
    Build {
        /// Path to the .btrp script
        file: PathBuf,
        /// Additional directory to search for imported scripts
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
    },

    /// Print the import tree of a .btrp script
    Deps {
        /// Path to the .btrp script
        file: PathBuf,
        /// Additional directory to search for imported scripts
        #[arg(short = 'I', long = "include")]
        include: Vec<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { file, include } => {
            cmd_build(&file, &include, cli.output, cli.quiet);
        }
        Commands::Deps { file, include } => {
            cmd_deps(&file, &include, cli.output, cli.quiet);
        }
    }
}
