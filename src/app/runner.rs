#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;

use eyre::{Result, bail};

use crate::cli::Commands;
use crate::services::ChatService;

use super::render;

/// Runs a non-interactive subcommand. Failures reported by the service
/// become the command's error.
pub async fn run_command(service: &ChatService, command: Commands) -> Result<()> {
    match command {
        Commands::List { page, page_size } => {
            let page_size = page_size.unwrap_or(service.page_size());
            let conversations = service.fetch_conversations(page, page_size).await;
            ensure_ok(service).await?;
            print!("{}", render::conversation_list(&conversations));
        }
        Commands::Summaries {
            page,
            page_size,
            search,
        } => {
            let page_size = page_size.unwrap_or(service.page_size());
            let summaries = service
                .conversation_summaries(page, page_size, &search)
                .await;
            ensure_ok(service).await?;
            if let Some(summaries) = summaries {
                print!("{}", render::summaries(&summaries));
            }
        }
        Commands::Show { id } => {
            service.open_conversation(&id).await;
            ensure_ok(service).await?;
            let state = service.store().read().await;
            print!("{}", render::transcript(&state.current));
        }
        Commands::Rename { id, title } => {
            service.change_title(&id, &title).await;
            ensure_ok(service).await?;
            println!("Renamed {} to \"{}\"", id, title);
        }
        Commands::Delete { id } => {
            service.delete_conversation(&id).await;
            ensure_ok(service).await?;
            println!("Deleted {}", id);
        }
        Commands::Switch { id, version_id } => {
            service.switch_version(&id, &version_id).await;
            ensure_ok(service).await?;
            let state = service.store().read().await;
            print!("{}", render::transcript(&state.current));
        }
        Commands::Chat { .. } => bail!("chat runs interactively"),
    }
    Ok(())
}

async fn ensure_ok(service: &ChatService) -> Result<()> {
    match service.store().read().await.error.clone() {
        Some(err) => bail!(err),
        None => Ok(()),
    }
}
