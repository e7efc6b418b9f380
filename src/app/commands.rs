#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;

use eyre::{Result, bail};

/// A line typed in the interactive chat.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Prompt(String),
    Command(SlashCommand),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    New,
    List,
    Open(String),
    Show,
    Versions,
    Switch(String),
    Branch(String),
    Regenerate,
    Title(String),
    Model(Option<String>),
    Help,
    Quit,
}

pub const HELP: &str = r#"Commands:
  /new                 start a new conversation
  /list                list saved conversations
  /open ID             open a saved conversation
  /show                print the transcript with message ids
  /versions            list versions of the current conversation
  /switch VERSION_ID   show another version
  /branch MESSAGE_ID   start a new version from a message
  /regenerate          regenerate the last reply
  /title TEXT          rename the current conversation
  /model [NAME]        show or change the model
  /help                show this help
  /quit                exit

Press Ctrl+C to stop a streaming reply."#;

impl Input {
    pub fn parse(line: &str) -> Result<Input> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Input::Empty);
        }
        if !line.starts_with('/') {
            return Ok(Input::Prompt(line.to_string()));
        }

        let (name, arg) = match line[1..].split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (&line[1..], ""),
        };

        let command = match name {
            "new" => SlashCommand::New,
            "list" | "ls" => SlashCommand::List,
            "open" => SlashCommand::Open(required(name, arg)?),
            "show" => SlashCommand::Show,
            "versions" => SlashCommand::Versions,
            "switch" => SlashCommand::Switch(required(name, arg)?),
            "branch" => SlashCommand::Branch(required(name, arg)?),
            "regenerate" | "regen" => SlashCommand::Regenerate,
            "title" => SlashCommand::Title(required(name, arg)?),
            "model" => SlashCommand::Model((!arg.is_empty()).then(|| arg.to_string())),
            "help" | "?" => SlashCommand::Help,
            "quit" | "exit" | "q" => SlashCommand::Quit,
            _ => bail!("unknown command /{}, type /help for the list", name),
        };
        Ok(Input::Command(command))
    }
}

fn required(name: &str, arg: &str) -> Result<String> {
    if arg.is_empty() {
        bail!("/{} needs an argument", name);
    }
    Ok(arg.to_string())
}
