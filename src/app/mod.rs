pub mod commands;
pub mod render;
pub mod repl;
pub mod runner;

pub use commands::{Input, SlashCommand};
pub use repl::Repl;
pub use runner::run_command;
