use clap::{Args, Subcommand};
use lookbook_core::CommunityApi;

use super::authenticated;
use crate::config::Config;

#[derive(Args)]
pub struct CreatorCommand {
    #[command(subcommand)]
    pub command: CreatorSubcommand,
}

#[derive(Subcommand)]
pub enum CreatorSubcommand {
    /// Follow a creator
    Follow {
        /// Creator ID
        creator: i64,
    },
    /// Stop following a creator
    Unfollow {
        /// Creator ID
        creator: i64,
    },
    /// Subscribe to a creator's paid collections
    Subscribe {
        /// Creator ID
        creator: i64,
    },
    /// Cancel a subscription
    Unsubscribe {
        /// Creator ID
        creator: i64,
    },
}

impl CreatorCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let (api, _) = authenticated(config).await?;

        match &self.command {
            CreatorSubcommand::Follow { creator } => {
                api.follow(*creator).await?;
                println!("Following creator #{}", creator);
            }
            CreatorSubcommand::Unfollow { creator } => {
                api.unfollow(*creator).await?;
                println!("No longer following creator #{}", creator);
            }
            CreatorSubcommand::Subscribe { creator } => {
                api.subscribe(*creator).await?;
                println!("Subscribed to creator #{}", creator);
            }
            CreatorSubcommand::Unsubscribe { creator } => {
                api.unsubscribe(*creator).await?;
                println!("Unsubscribed from creator #{}", creator);
            }
        }
        Ok(())
    }
}
