use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    AuthCommand, CollectionCommand, ConfigCommand, CreatorCommand, ItemCommand, OutfitCommand,
    ReviewCommand,
};
use config::Config;

#[derive(Parser)]
#[command(name = "lookbook")]
#[command(version)]
#[command(about = "Browse and curate fashion collections", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, log out and inspect the saved session
    Auth(AuthCommand),

    /// Browse, edit and delete collections
    Collection(CollectionCommand),

    /// Add, change and remove outfits of a collection
    Outfit(OutfitCommand),

    /// Add, change and remove items of an outfit
    Item(ItemCommand),

    /// Read and write reviews
    Review(ReviewCommand),

    /// Follow and subscribe to creators
    Creator(CreatorCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lookbook=info,lookbook_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;
    tracing::debug!("Using API at {}", config.api_url.value);

    match cli.command {
        Some(Commands::Auth(cmd)) => cmd.run(&config).await?,
        Some(Commands::Collection(cmd)) => cmd.run(&config).await?,
        Some(Commands::Outfit(cmd)) => cmd.run(&config).await?,
        Some(Commands::Item(cmd)) => cmd.run(&config).await?,
        Some(Commands::Review(cmd)) => cmd.run(&config).await?,
        Some(Commands::Creator(cmd)) => cmd.run(&config).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config, cli_config_path)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
