use clap::Parser;

use super::*;

#[test]
fn test_default_command_is_chat() {
    let cmd = Command::try_parse_from(["branchat"]).expect("failed to parse");
    assert!(!cmd.version());
    assert_eq!(
        cmd.command(),
        Commands::Chat {
            conversation: None,
            model: None
        }
    );
}

#[test]
fn test_parse_subcommands() {
    let cmd = Command::try_parse_from(["branchat", "list", "--page", "2", "--page-size", "10"])
        .expect("failed to parse");
    assert_eq!(
        cmd.command(),
        Commands::List {
            page: 2,
            page_size: Some(10)
        }
    );

    let cmd = Command::try_parse_from(["branchat", "switch", "c1", "v2", "--config", "x.toml"])
        .expect("failed to parse");
    assert_eq!(
        cmd.command(),
        Commands::Switch {
            id: "c1".to_string(),
            version_id: "v2".to_string()
        }
    );

    let cmd = Command::try_parse_from(["branchat", "chat", "--conversation", "c1", "-m", "gpt-4"])
        .expect("failed to parse");
    assert_eq!(
        cmd.command(),
        Commands::Chat {
            conversation: Some("c1".to_string()),
            model: Some("gpt-4".to_string())
        }
    );
}

#[test]
fn test_get_config_from_file() {
    let cmd = Command::try_parse_from(["branchat", "--config", "./testdata/config.toml"])
        .expect("failed to parse");
    let config = cmd.get_config().expect("failed to load config");
    assert_eq!(config.server.endpoint, "https://chat.example.com");
    assert_eq!(config.chat.default_model, "gpt-4");
}

#[test]
fn test_get_config_missing_file() {
    let cmd = Command::try_parse_from(["branchat", "--config", "./testdata/missing.toml"])
        .expect("failed to parse");
    assert!(cmd.get_config().is_err());
}

#[test]
fn test_version_string() {
    assert_eq!(
        crate::config::version(),
        format!("branchat {}", env!("CARGO_PKG_VERSION"))
    );
    assert!(crate::config::user_agent().starts_with("branchat/"));
}
