#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

use clap::{Parser, Subcommand};
use eyre::{Context, Result};

use crate::config::{self, Configuration, load_configuration, lookup_config_path};

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"A terminal client for a branching chat backend

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/branchat/config.toml
    * $HOME/.config/branchat/config.toml
    * $HOME/.branchat.toml
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<String>,

    /// Show the version
    #[arg(short, long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Commands {
    /// List conversations with their versions
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Search conversation summaries
    Summaries {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Print the active version of a conversation
    Show { id: String },

    /// Rename a conversation
    Rename { id: String, title: String },

    /// Delete a conversation
    Delete { id: String },

    /// Make another version of a conversation active
    Switch { id: String, version_id: String },

    /// Start an interactive chat
    Chat {
        /// Open an existing conversation
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,

        /// Model used for completions
        #[arg(short, long)]
        model: Option<String>,
    },
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        if config_path.is_empty() {
            // No config path is specified just use the default config
            return Ok(Configuration::default());
        }
        load_configuration(config_path.as_str()).wrap_err("loading configuration")
    }

    /// The subcommand to run, an interactive chat when none is given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat {
            conversation: None,
            model: None,
        })
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }
}
