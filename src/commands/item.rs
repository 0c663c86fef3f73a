use clap::{Args, Subcommand};
use lookbook_core::OutfitItem;

use super::{finish_edit, open_edit};
use crate::config::Config;

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Add a shoppable item to an outfit
    Add {
        /// Collection ID
        collection: i64,

        /// Outfit ID
        outfit: i64,

        /// Item image URL
        #[arg(long)]
        image: String,

        /// Store selling the item
        #[arg(long)]
        store: String,

        /// Product page URL
        #[arg(long)]
        link: String,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Change an item
    Update {
        /// Collection ID
        collection: i64,

        /// Item ID
        item: i64,

        /// New image URL
        #[arg(long)]
        image: Option<String>,

        /// New store name
        #[arg(long)]
        store: Option<String>,

        /// New product page URL
        #[arg(long)]
        link: Option<String>,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove an item
    Remove {
        /// Collection ID
        collection: i64,

        /// Item ID
        item: i64,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },
}

impl ItemCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ItemSubcommand::Add {
                collection,
                outfit,
                image,
                store,
                link,
                dry_run,
            } => {
                let mut edit = open_edit(config, *collection).await?;
                let index = edit
                    .find_outfit(*outfit)
                    .ok_or_else(|| format!("Outfit not found: {}", outfit))?;

                edit.add_item(index, OutfitItem::new(image.clone(), store.clone(), link.clone()))?;
                finish_edit(&mut edit, *dry_run).await
            }

            ItemSubcommand::Update {
                collection,
                item,
                image,
                store,
                link,
                dry_run,
            } => {
                if image.is_none() && store.is_none() && link.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let mut edit = open_edit(config, *collection).await?;
                let (outfit_index, item_index) = edit
                    .find_item(*item)
                    .ok_or_else(|| format!("Item not found: {}", item))?;

                edit.update_item(outfit_index, item_index, |i| {
                    if let Some(image) = image {
                        i.image_url = image.clone();
                    }
                    if let Some(store) = store {
                        i.store_name = store.clone();
                    }
                    if let Some(link) = link {
                        i.product_link = link.clone();
                    }
                })?;
                finish_edit(&mut edit, *dry_run).await
            }

            ItemSubcommand::Remove {
                collection,
                item,
                dry_run,
            } => {
                let mut edit = open_edit(config, *collection).await?;
                let (outfit_index, item_index) = edit
                    .find_item(*item)
                    .ok_or_else(|| format!("Item not found: {}", item))?;

                edit.remove_item(outfit_index, item_index)?;
                finish_edit(&mut edit, *dry_run).await
            }
        }
    }
}
