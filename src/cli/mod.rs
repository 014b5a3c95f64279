//! CLI module for AskVox.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// AskVox - conversational backend for the Vox voice assistant
///
/// Routes each utterance to a plain chat answer, a media lookup or a live web
/// search summary, while keeping a bounded conversation history.
#[derive(Parser, Debug)]
#[command(name = "askvox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat,

    /// Send a single utterance and print the answer
    Ask {
        /// The utterance to answer
        text: String,
    },

    /// Answer one utterance per stdin line, one JSON line per answer on stdout
    Listen,

    /// Start the HTTP API used by the assistant front end
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the current configuration to the config file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["askvox", "-vv", "serve", "--port", "9000"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ask_with_config() {
        let cli = Cli::parse_from(["askvox", "ask", "show me a wallpaper", "--config", "/tmp/vox.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/vox.toml"));
        assert!(matches!(cli.command, Commands::Ask { ref text } if text == "show me a wallpaper"));
    }
}
