//! junos-provider - Junos configuration as Terraform-style resources
//!
//! This is the main entry point for the junos-provider CLI.

mod cli;

use anyhow::Result;
use cli::commands::lifecycle::DocumentOp;
use cli::commands::{inspect, CommandContext};
use cli::{Cli, Commands, LogFormat};
use junos_provider::config::ProviderConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), cli.log_format);

    if cli.verbosity() >= 2 {
        eprintln!("junos-provider v{}", VERSION);
    }

    // Load configuration
    let config = ProviderConfig::load(cli.config.as_ref())?;

    // Create command context
    let ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let exit_code = match &cli.command {
        Commands::Resources => inspect::resources(&ctx)?,
        Commands::Schema(args) => args.execute(&ctx)?,
        Commands::Validate(args) => args.validate(&ctx)?,
        Commands::Plan(args) => args.execute(&ctx)?,
        Commands::Create(args) => args.run(DocumentOp::Create, &ctx).await?,
        Commands::Read(args) => args.run(DocumentOp::Read, &ctx).await?,
        Commands::Update(args) => args.execute(&ctx).await?,
        Commands::Delete(args) => args.run(DocumentOp::Delete, &ctx).await?,
        Commands::Import(args) => args.execute(&ctx).await?,
    };

    std::process::exit(exit_code);
}

/// Initialize logging on stderr based on verbosity level
fn init_logging(verbosity: u8, format: LogFormat) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbosity >= 3),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
