use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `chatbridge` - relay WeChat and Telegram messages to OpenAI chat completions.
#[derive(Parser, Debug)]
#[command(name = "chatbridge")]
#[command(version)]
#[command(about = "Relay instant messages to an OpenAI chat-completion endpoint.", long_about = None)]
pub struct Cli {
    /// Path to config.toml (default: ~/.chatbridge/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the backend selected by the WECHAT / TELEGRAM settings (default)
    Run,

    /// Send one message through the completion client and print the reply
    Ask {
        /// Message text
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_run() {
        let cli = Cli::try_parse_from(["chatbridge"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn ask_takes_message_and_global_flags() {
        let cli = Cli::try_parse_from([
            "chatbridge",
            "ask",
            "hello there",
            "--config",
            "/tmp/c.toml",
            "-v",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Ask {
                message: "hello there".into()
            })
        );
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn ask_requires_message() {
        assert!(Cli::try_parse_from(["chatbridge", "ask"]).is_err());
    }
}
