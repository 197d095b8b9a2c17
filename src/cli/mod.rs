use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "open-ai", alias = "openai")]
    OpenAI,
    #[value(alias = "anthropic", alias = "claude")]
    Anthropic,
    #[value(alias = "ollama")]
    Ollama,
}

#[derive(Parser, Debug)]
#[command(name = "webastro", version, about = "Astrological insights chat in your terminal")]
pub struct Args {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Where the birth-details slot and exchange artifacts live
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Save each provider request/response under <data-dir>/tx/
    #[arg(long, default_value_t = false, global = true)]
    pub save_exchanges: bool,

    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enter birth details; prompts for anything not given as a flag
    GetStarted {
        /// YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// HH:MM, 24-hour
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Chat about your stars using the saved birth details
    Chat,
    /// Print conversation starters
    Suggest {
        #[arg(long)]
        topic: Option<String>,
    },
    /// Summarize astrological data; pass `-` to read stdin
    Summarize { data: String },
    /// Compose a message to the site owner
    Contact {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
    /// Inspect or remove the saved birth details
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ProfileAction {
    Show,
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["webastro", "chat", "--provider", "claude", "--debug"]).unwrap();
        assert_eq!(args.provider, Some(ProviderKind::Anthropic));
        assert!(args.debug);
        assert!(matches!(args.command, Command::Chat));
    }

    #[test]
    fn get_started_flags_are_optional() {
        let args = Args::try_parse_from(["webastro", "get-started", "--time", "14:30"]).unwrap();
        match args.command {
            Command::GetStarted { date, time, .. } => {
                assert!(date.is_none());
                assert_eq!(time.as_deref(), Some("14:30"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
