//! Authentication commands for the Lookbook CLI.
//!
//! The identity provider issues an ID token out of band; `login` stores it
//! together with the profile fetched from `/me`.

use clap::{Args, Subcommand};
use lookbook_core::{HttpApi, Session, SessionError};
use std::io::{self, Write};

use super::session_store;
use crate::config::Config;

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Log in with an ID token (prompts when omitted)
    Login {
        /// ID token issued by the identity provider
        #[arg(long)]
        token: Option<String>,
    },
    /// Log out (remove the saved session)
    Logout,
    /// Show authentication status
    Status,
    /// Re-fetch the profile of the logged-in user
    Refresh,
}

impl AuthCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            AuthSubcommand::Login { token } => login(config, token.clone()).await,
            AuthSubcommand::Logout => logout(config),
            AuthSubcommand::Status => status(config),
            AuthSubcommand::Refresh => refresh(config).await,
        }
    }
}

async fn login(config: &Config, token: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let token = match token {
        Some(token) => token,
        None => {
            print!("Paste your ID token: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    if token.is_empty() {
        return Err("ID token cannot be empty".into());
    }

    let mut session = Session::from_token(token)?;
    if session.is_expired() {
        return Err(SessionError::Expired.into());
    }

    let api = HttpApi::new(&config.api_url.value).with_token(session.token());
    let profile = session.refresh(&api).await?.clone();

    let store = session_store(config);
    store.save(&session)?;
    tracing::info!("Saved session to {}", store.path().display());

    println!("Logged in as {}", profile);
    Ok(())
}

fn logout(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if session_store(config).clear()? {
        println!("Logged out.");
    } else {
        println!("Already logged out.");
    }
    Ok(())
}

fn status(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let session = match session_store(config).load() {
        Ok(Some(session)) => session,
        Ok(None) => {
            println!("Not logged in. Run 'lookbook auth login' to authenticate.");
            return Ok(());
        }
        Err(SessionError::Expired) => {
            println!("Session expired. Run 'lookbook auth login' again.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match session.profile() {
        Some(profile) => println!("Logged in as {}", profile),
        None => println!("Logged in (subject {})", session.claims().sub),
    }
    if let Some(email) = &session.claims().email {
        println!("  email: {}", email);
    }
    println!("  token: {}", mask_token(session.token()));
    if let Some(expires_at) = session.claims().expires_at() {
        println!("  expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

async fn refresh(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = session_store(config);
    let mut session = store.require()?;
    let api = HttpApi::new(&config.api_url.value).with_token(session.token());

    let profile = session.refresh(&api).await?.clone();
    store.save(&session)?;

    println!("Profile refreshed: {}", profile);
    Ok(())
}

fn mask_token(token: &str) -> String {
    if token.len() > 12 {
        format!("{}...{}", &token[..6], &token[token.len() - 4..])
    } else {
        "****".to_string()
    }
}
