use clap::{Args, Subcommand};
use lookbook_core::Outfit;

use super::{finish_edit, open_edit};
use crate::config::Config;

#[derive(Args)]
pub struct OutfitCommand {
    #[command(subcommand)]
    pub command: OutfitSubcommand,
}

#[derive(Subcommand)]
pub enum OutfitSubcommand {
    /// Add an outfit to a collection
    Add {
        /// Collection ID
        collection: i64,

        /// Outfit description
        #[arg(long)]
        description: String,

        /// Outfit image URL
        #[arg(long)]
        image: String,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Change an outfit
    Update {
        /// Collection ID
        collection: i64,

        /// Outfit ID
        outfit: i64,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New image URL
        #[arg(long)]
        image: Option<String>,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove an outfit and its items
    Remove {
        /// Collection ID
        collection: i64,

        /// Outfit ID
        outfit: i64,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },
}

impl OutfitCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            OutfitSubcommand::Add {
                collection,
                description,
                image,
                dry_run,
            } => {
                if description.trim().is_empty() {
                    return Err("Outfit description cannot be empty".into());
                }

                let mut edit = open_edit(config, *collection).await?;
                edit.add_outfit(Outfit::new(description.trim(), image.clone()));
                finish_edit(&mut edit, *dry_run).await
            }

            OutfitSubcommand::Update {
                collection,
                outfit,
                description,
                image,
                dry_run,
            } => {
                if description.is_none() && image.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut edit = open_edit(config, *collection).await?;
                let index = edit
                    .find_outfit(*outfit)
                    .ok_or_else(|| format!("Outfit not found: {}", outfit))?;

                edit.update_outfit(index, |o| {
                    if let Some(description) = description {
                        o.description = description.clone();
                    }
                    if let Some(image) = image {
                        o.image_url = image.clone();
                    }
                })?;
                finish_edit(&mut edit, *dry_run).await
            }

            OutfitSubcommand::Remove {
                collection,
                outfit,
                dry_run,
            } => {
                let mut edit = open_edit(config, *collection).await?;
                let index = edit
                    .find_outfit(*outfit)
                    .ok_or_else(|| format!("Outfit not found: {}", outfit))?;

                let removed = edit.remove_outfit(index)?;
                tracing::debug!(
                    "Removing outfit #{} with {} item(s)",
                    outfit,
                    removed.outfit_items.len()
                );
                finish_edit(&mut edit, *dry_run).await
            }
        }
    }
}
