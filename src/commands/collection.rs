use clap::{Args, Subcommand};
use lookbook_core::{Collection, CollectionApi, Genre};
use std::io::{self, Write};
use std::path::PathBuf;

use super::{anonymous_api, authenticated, finish_edit, open_edit, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct CollectionCommand {
    #[command(subcommand)]
    pub command: CollectionSubcommand,
}

#[derive(Subcommand)]
pub enum CollectionSubcommand {
    /// List published collections
    List {
        /// Only collections owned by the logged-in user
        #[arg(long)]
        mine: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a collection with its outfits and items
    Show {
        /// Collection ID
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Edit the fields of a collection you own
    Edit {
        /// Collection ID
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New cover image URL
        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,

        /// Remove the cover image
        #[arg(long)]
        clear_image: bool,

        /// Make the collection subscriber-only
        #[arg(long, conflicts_with = "free")]
        paid: bool,

        /// Make the collection free
        #[arg(long)]
        free: bool,

        /// Replace the genres (genre IDs, can be repeated)
        #[arg(long = "genre", value_name = "ID")]
        genres: Vec<i64>,

        /// Replace the seasons (can be repeated)
        #[arg(long = "season", value_name = "SEASON")]
        seasons: Vec<String>,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Save an edited JSON export of a collection
    Apply {
        /// Collection ID
        id: i64,

        /// JSON file as printed by `collection show --format json`
        #[arg(long)]
        file: PathBuf,

        /// Delete an outfit (outfit ID, can be repeated)
        #[arg(long = "remove-outfit", value_name = "ID")]
        remove_outfits: Vec<i64>,

        /// Delete an item (item ID, can be repeated)
        #[arg(long = "remove-item", value_name = "ID")]
        remove_items: Vec<i64>,

        /// Print the planned changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete a collection with all its outfits and items
    Delete {
        /// Collection ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl CollectionCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CollectionSubcommand::List { mine, format } => {
                let collections = if *mine {
                    let (api, session) = authenticated(config).await?;
                    let actor_id = session.actor_id()?;
                    api.list_collections()
                        .await?
                        .into_iter()
                        .filter(|c| c.is_owned_by(actor_id))
                        .collect()
                } else {
                    anonymous_api(config).list_collections().await?
                };

                if collections.is_empty() {
                    println!("No collections found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&collections)?);
                    }
                    OutputFormat::Text => print_table(&collections),
                }
                Ok(())
            }

            CollectionSubcommand::Show { id, format } => {
                let (api, session) = authenticated(config).await?;
                let collection = api.fetch_collection_detail(*id, session.actor_id()?).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&collection)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", collection);
                    }
                }
                Ok(())
            }

            CollectionSubcommand::Edit {
                id,
                title,
                description,
                image,
                clear_image,
                paid,
                free,
                genres,
                seasons,
                dry_run,
            } => {
                let has_updates = title.is_some()
                    || description.is_some()
                    || image.is_some()
                    || *clear_image
                    || *paid
                    || *free
                    || !genres.is_empty()
                    || !seasons.is_empty();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }
                if let Some(title) = title {
                    if title.trim().is_empty() {
                        return Err("Collection title cannot be empty".into());
                    }
                }

                let mut edit = open_edit(config, *id).await?;

                if let Some(title) = title {
                    edit.set_title(title.trim());
                }
                if let Some(description) = description {
                    edit.set_description(description.clone());
                }
                if image.is_some() {
                    edit.set_image(image.clone());
                }
                if *clear_image {
                    edit.set_image(None);
                }
                if *paid || *free {
                    edit.set_paid(*paid);
                }
                if !genres.is_empty() {
                    edit.set_genres(merge_genres(&edit.snapshot().genres, genres));
                }
                if !seasons.is_empty() {
                    edit.set_seasons(seasons.clone());
                }

                finish_edit(&mut edit, *dry_run).await
            }

            CollectionSubcommand::Apply {
                id,
                file,
                remove_outfits,
                remove_items,
                dry_run,
            } => {
                let contents = std::fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let edited: Collection = serde_json::from_str(&contents)
                    .map_err(|e| format!("Failed to parse '{}': {}", file.display(), e))?;

                let mut edit = open_edit(config, *id).await?;

                // Removals go through the session first so their ids are recorded
                for item_id in remove_items {
                    let (outfit_index, item_index) = edit
                        .find_item(*item_id)
                        .ok_or_else(|| format!("Item not found: {}", item_id))?;
                    edit.remove_item(outfit_index, item_index)?;
                }
                for outfit_id in remove_outfits {
                    let index = edit
                        .find_outfit(*outfit_id)
                        .ok_or_else(|| format!("Outfit not found: {}", outfit_id))?;
                    edit.remove_outfit(index)?;
                }

                edit.replace_working_copy(edited);
                finish_edit(&mut edit, *dry_run).await
            }

            CollectionSubcommand::Delete { id, force } => {
                let edit = open_edit(config, *id).await?;
                let title = edit.snapshot().title.clone();

                if !force {
                    print!(
                        "Delete collection '{}' with {} outfit(s)? [y/N] ",
                        title,
                        edit.snapshot().outfits.len()
                    );
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                edit.delete_collection().await?;
                println!("Deleted collection: {}", title);
                Ok(())
            }
        }
    }
}

fn print_table(collections: &[Collection]) {
    println!("{:<8}  {:<30}  {:<5}  OUTFITS", "ID", "TITLE", "PAID");
    println!("{}", "-".repeat(60));
    for collection in collections {
        let title = if collection.title.chars().count() > 30 {
            format!("{}...", collection.title.chars().take(27).collect::<String>())
        } else {
            collection.title.clone()
        };
        println!(
            "{:<8}  {:<30}  {:<5}  {}",
            collection.id,
            title,
            if collection.is_paid { "yes" } else { "no" },
            collection.outfits.len()
        );
    }
    println!("\nTotal: {} collection(s)", collections.len());
}

/// Builds the genre list for the given ids, keeping known names.
fn merge_genres(known: &[Genre], ids: &[i64]) -> Vec<Genre> {
    ids.iter()
        .map(|id| {
            known
                .iter()
                .find(|g| g.id == Some(*id))
                .cloned()
                .unwrap_or_else(|| Genre::new(*id, ""))
        })
        .collect()
}
