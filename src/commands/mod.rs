mod auth;
mod collection;
mod config_cmd;
mod creator;
mod item;
mod outfit;
mod review;

pub use auth::AuthCommand;
pub use collection::CollectionCommand;
pub use config_cmd::ConfigCommand;
pub use creator::CreatorCommand;
pub use item::ItemCommand;
pub use outfit::OutfitCommand;
pub use review::ReviewCommand;

use clap::ValueEnum;
use lookbook_core::{
    ApplyReport, EditSession, HttpApi, OperationSet, Session, SessionStore, SubmitLocks,
};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn session_store(config: &Config) -> SessionStore {
    SessionStore::new(&config.data_dir.value)
}

/// Client for calls that need no login.
pub fn anonymous_api(config: &Config) -> HttpApi {
    HttpApi::new(&config.api_url.value)
}

/// Loads the saved session and builds a client carrying its token. A session
/// saved without a profile is refreshed once and saved again.
pub async fn authenticated(
    config: &Config,
) -> Result<(HttpApi, Session), Box<dyn std::error::Error>> {
    let store = session_store(config);
    let mut session = store.require()?;
    let api = HttpApi::new(&config.api_url.value).with_token(session.token());

    if session.profile().is_none() {
        session.refresh(&api).await?;
        store.save(&session)?;
    }

    Ok((api, session))
}

/// Opens an edit session on a collection the logged-in user owns.
pub async fn open_edit(
    config: &Config,
    collection_id: i64,
) -> Result<EditSession<HttpApi>, Box<dyn std::error::Error>> {
    let (api, session) = authenticated(config).await?;
    let edit = EditSession::open(api, SubmitLocks::new(), &session, collection_id).await?;
    Ok(edit)
}

pub fn print_plan(operations: &OperationSet) {
    if operations.is_empty() {
        println!("No changes");
        return;
    }
    println!("Planned changes:");
    for operation in operations {
        println!("  {}", operation);
    }
    println!("\nTotal: {} operation(s)", operations.len());
}

pub fn print_report(report: &ApplyReport) {
    if report.is_empty() {
        println!("No changes");
        return;
    }
    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(()) => println!("  ok      {}", outcome.operation),
            Err(e) => println!("  FAILED  {}: {}", outcome.operation, e),
        }
    }
    println!(
        "\nSaved {} of {} change(s)",
        report.success_count(),
        report.outcomes().len()
    );
    if !report.is_clean() {
        println!("Failed changes were not applied. Review the collection and submit again.");
    }
}

/// Plans or submits an edit session and prints the outcome. A submit with
/// failed operations still succeeds; the failures are in the printed report.
pub async fn finish_edit(
    edit: &mut EditSession<HttpApi>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if dry_run {
        print_plan(&edit.plan());
        return Ok(());
    }
    let report = edit.submit().await?;
    print_report(&report);
    Ok(())
}
