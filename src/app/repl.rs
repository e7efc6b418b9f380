#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;

use crate::models::Event;
use crate::services::ChatService;

use super::commands::{HELP, Input, SlashCommand};
use super::render;

/// Line-based interactive chat. Replies are echoed while they stream;
/// Ctrl+C stops a running reply and exits otherwise.
pub struct Repl {
    service: ChatService,
    models: Vec<String>,
    cancel_token: CancellationToken,
}

impl Repl {
    pub fn new(service: ChatService, models: Vec<String>, cancel_token: CancellationToken) -> Self {
        Self {
            service,
            models,
            cancel_token,
        }
    }

    pub async fn run(
        &mut self,
        event_rx: mpsc::UnboundedReceiver<Event>,
        conversation: Option<String>,
    ) -> Result<()> {
        let mut task_set = task::JoinSet::new();
        task_set.spawn(print_events(event_rx, self.cancel_token.clone()));
        task_set.spawn(watch_interrupts(
            self.service.clone(),
            self.cancel_token.clone(),
        ));

        if let Some(id) = conversation {
            self.handle(Input::Command(SlashCommand::Open(id))).await;
        }
        println!("Type a message to chat, /help for commands.");

        let result = self.read_loop().await;

        self.cancel_token.cancel();
        self.service.stop().await;
        task_set.abort_all();
        while let Some(res) = task_set.join_next().await {
            match res {
                Ok(Err(err)) => log::error!("Task error: {}", err),
                Err(err) if !err.is_cancelled() => log::error!("Task error: {}", err),
                _ => {}
            }
        }
        result
    }

    async fn read_loop(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = self.cancel_token.cancelled() => return Ok(()),
                line = lines.next_line() => line.wrap_err("reading input")?,
            };
            let Some(line) = line else {
                return Ok(());
            };

            match Input::parse(&line) {
                Ok(input) => {
                    if !self.handle(input).await {
                        return Ok(());
                    }
                }
                Err(err) => eprintln!("{}", err),
            }
        }
    }

    /// Runs one input line. Returns `false` when the session should end.
    pub async fn handle(&mut self, input: Input) -> bool {
        let command = match input {
            Input::Empty => return true,
            Input::Prompt(text) => {
                self.service.send_prompt(&text).await;
                return true;
            }
            Input::Command(command) => command,
        };

        match command {
            SlashCommand::New => {
                self.service.start_new_conversation().await;
                println!("Started a new conversation.");
            }
            SlashCommand::List => {
                let page_size = self.service.page_size();
                self.service.fetch_conversations(1, page_size).await;
                let state = self.service.store().read().await;
                print!("{}", render::conversation_list(state.conversations.conversations()));
            }
            SlashCommand::Open(id) => {
                if self.service.open_conversation(&id).await {
                    self.print_transcript().await;
                }
            }
            SlashCommand::Show => self.print_transcript().await,
            SlashCommand::Versions => self.print_versions().await,
            SlashCommand::Switch(version_id) => {
                let Some(conversation_id) = self.saved_conversation_id().await else {
                    return true;
                };
                if self
                    .service
                    .switch_version(&conversation_id, &version_id)
                    .await
                {
                    self.print_transcript().await;
                }
            }
            SlashCommand::Branch(message_id) => {
                self.service.branch(&message_id).await;
            }
            SlashCommand::Regenerate => {
                self.service.regenerate().await;
            }
            SlashCommand::Title(title) => {
                if self.service.rename_current(&title).await {
                    println!("Renamed to \"{}\"", title.trim());
                }
            }
            SlashCommand::Model(None) => {
                let current = self.service.store().read().await.model.clone();
                for model in &self.models {
                    let marker = if *model == current { "*" } else { " " };
                    println!("{} {}", marker, model);
                }
            }
            SlashCommand::Model(Some(model)) => {
                if !self.models.contains(&model) {
                    eprintln!("Unknown model {}, available: {}", model, self.models.join(", "));
                } else if self.service.set_model(&model).await {
                    println!("Using {}", model);
                }
            }
            SlashCommand::Help => println!("{}", HELP),
            SlashCommand::Quit => return false,
        }
        true
    }

    async fn print_transcript(&self) {
        let state = self.service.store().read().await;
        print!("{}", render::transcript(&state.current));
    }

    async fn print_versions(&self) {
        let Some(conversation_id) = self.saved_conversation_id().await else {
            return;
        };
        let known = self
            .service
            .store()
            .read()
            .await
            .conversations
            .get(&conversation_id)
            .is_some();
        if !known && self.service.fetch_branched(&conversation_id).await.is_none() {
            return;
        }

        let state = self.service.store().read().await;
        if let Some(convo) = state.conversations.get(&conversation_id) {
            print!("{}", render::versions(convo, state.current.id()));
        }
    }

    async fn saved_conversation_id(&self) -> Option<String> {
        let state = self.service.store().read().await;
        if !state.current.is_persisted() {
            eprintln!("This conversation is not saved yet.");
            return None;
        }
        Some(state.current.conversation_id().to_string())
    }
}

async fn print_events(
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    loop {
        let event = tokio::select! {
            _ = cancel_token.cancelled() => return Ok(()),
            event = event_rx.recv() => event,
        };
        let Some(event) = event else {
            return Ok(());
        };
        if let Some(text) = render::event_text(&event) {
            stdout
                .write_all(text.as_bytes())
                .await
                .wrap_err("writing event")?;
            stdout.flush().await.wrap_err("flushing stdout")?;
        }
    }
}

async fn watch_interrupts(service: ChatService, cancel_token: CancellationToken) -> Result<()> {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => return Ok(()),
            res = tokio::signal::ctrl_c() => {
                res.wrap_err("listening for ctrl-c")?;
                if service.is_streaming().await {
                    log::debug!("Stopping the running stream");
                    service.stop().await;
                } else {
                    cancel_token.cancel();
                    return Ok(());
                }
            }
        }
    }
}
