use std::sync::Arc;

use branchat::api::new_api;
use branchat::app::{Repl, run_command};
use branchat::cli::{Command, Commands};
use branchat::config::{Configuration, init_logger, verbose};
use branchat::models::Event;
use branchat::services::ChatService;
use branchat::store::{AppState, Store};
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    init_logger(&config.log)?;
    Configuration::init(config.clone())?;
    verbose!("[+] Logger initialized");

    let api = new_api(&config.server).wrap_err("initializing chat backend")?;
    verbose!("[+] Using backend {}", config.server.endpoint);

    let command = cmd.command();
    let model = match &command {
        Commands::Chat {
            model: Some(model), ..
        } => model.clone(),
        _ => config.chat.default_model.clone(),
    };

    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let store = Store::new(AppState::new(model));
    let service = ChatService::new(api, store, Arc::new(event_tx))
        .with_fallback_title(&config.chat.fallback_title)
        .with_page_size(config.chat.page_size);

    match command {
        Commands::Chat { conversation, .. } => {
            verbose!("[+] Starting chat...");
            let mut repl = Repl::new(service, config.chat.models.clone(), CancellationToken::new());
            if let Err(err) = repl.run(event_rx, conversation).await {
                eprintln!("Error: {}", err);
            }
        }
        command => {
            let _event_rx = event_rx;
            run_command(&service, command).await?;
        }
    }

    Ok(())
}
