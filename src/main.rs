use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod parsing;
mod resolving;
mod rules;
mod staging;
mod utils;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("calref=debug,info")
    } else {
        EnvFilter::new("calref=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Resolve(args) => {
            cli::resolve::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Locate(args) => {
            cli::locate::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Tables(args) => {
            cli::tables::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Executables(args) => {
            cli::executables::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::FixKeywords(args) => {
            cli::fix_keywords::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Obsmodes(args) => {
            cli::obsmodes::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
