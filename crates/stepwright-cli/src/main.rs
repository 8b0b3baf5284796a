//! Stepwright CLI tool.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stepwright")]
#[command(about = "Compile pipeline step declarations into executable steps", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, env = "STEPWRIGHT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a step manifest into step descriptors
    Compile {
        /// Path to the compilation context
        #[arg(long, short, env = "STEPWRIGHT_CONTEXT", default_value = "stepwright-context.kdl")]
        context: String,
        /// Path to the step manifest
        #[arg(default_value = "stepwright.kdl")]
        manifest: String,
        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Validate a step manifest
    Validate {
        /// Path to the step manifest
        #[arg(default_value = "stepwright.kdl")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so compiled output stays clean on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Compile {
            context,
            manifest,
            compact,
        } => {
            commands::compile::compile(&context, &manifest, compact).await?;
        }
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
    }

    Ok(())
}
