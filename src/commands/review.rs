use clap::{Args, Subcommand};
use lookbook_core::{NewReview, ReviewThread};

use super::{anonymous_api, authenticated, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ReviewCommand {
    #[command(subcommand)]
    pub command: ReviewSubcommand,
}

#[derive(Subcommand)]
pub enum ReviewSubcommand {
    /// List reviews of a collection
    List {
        /// Collection ID
        collection: i64,

        /// Reviews per page
        #[arg(long, default_value_t = lookbook_core::reviews::DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Load every page instead of only the first
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Review a collection
    Add {
        /// Collection ID
        collection: i64,

        /// Rating from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        /// Review text
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Answer a review of your collection
    Answer {
        /// Collection ID
        collection: i64,

        /// Review ID
        review: i64,

        /// Answer text
        #[arg(long)]
        text: String,
    },
}

impl ReviewCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ReviewSubcommand::List {
                collection,
                page_size,
                all,
                format,
            } => {
                let api = anonymous_api(config);
                let mut thread = ReviewThread::with_page_size(*collection, *page_size);

                thread.load_next(&api).await?;
                while *all && thread.has_more() {
                    thread.load_next(&api).await?;
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(thread.reviews())?);
                    }
                    OutputFormat::Text => {
                        if thread.reviews().is_empty() {
                            println!("No reviews yet");
                            return Ok(());
                        }
                        for review in thread.reviews() {
                            println!("{}", review);
                        }
                        if thread.has_more() {
                            println!("More reviews available, use --all to load them.");
                        }
                    }
                }
                Ok(())
            }

            ReviewSubcommand::Add {
                collection,
                rating,
                comment,
            } => {
                let (api, _) = authenticated(config).await?;
                let mut thread = ReviewThread::new(*collection);

                let review = thread
                    .post(
                        &api,
                        &NewReview {
                            rating: *rating,
                            comment: comment.trim().to_string(),
                        },
                    )
                    .await?;

                println!("Posted review:");
                println!("{}", review);
                Ok(())
            }

            ReviewSubcommand::Answer {
                collection,
                review,
                text,
            } => {
                if text.trim().is_empty() {
                    return Err("Answer text cannot be empty".into());
                }

                let (api, _) = authenticated(config).await?;
                let mut thread = ReviewThread::new(*collection);
                thread.answer(&api, *review, text.trim()).await?;

                println!("Answered review #{}", review);
                Ok(())
            }
        }
    }
}
