//! CLI command definitions and dispatch for the `agora` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped the
//! way the chat commands are: `agora agent ...` for personas and
//! conversations, `agora global ...` for per-user settings.

pub mod agent;
pub mod global;
pub mod output;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use agora_types::channel::ChannelId;
use agora_types::config::UserKey;

/// Multi-agent conversations between local-model personas.
#[derive(Parser)]
#[command(name = "agora", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// User whose personas and settings are used.
    #[arg(long, global = true, env = "AGORA_USER", default_value = "default")]
    pub user: String,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Use DISCORD_TEST_TOKEN instead of DISCORD_TOKEN.
    #[arg(long, global = true)]
    pub test: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn user_key(&self) -> UserKey {
        UserKey::new(self.user.trim())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage personas and run conversations.
    Agent {
        #[command(subcommand)]
        action: AgentCommand,
    },

    /// Per-user settings and channel maintenance.
    Global {
        #[command(subcommand)]
        action: GlobalCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List all personas and their status.
    #[command(alias = "ls")]
    List,

    /// Create a persona.
    Create {
        /// Unique name (no spaces).
        name: String,

        /// Personality appended to the system prompt.
        personality: String,

        /// Avatar image URL.
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Delete a persona.
    #[command(alias = "rm")]
    Delete {
        name: String,
    },

    /// Delete every persona.
    DeleteAll {
        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Activate or deactivate a persona.
    Toggle {
        name: String,
    },

    /// Replace all personas with the built-in set.
    Default,

    /// Run a multi-turn conversation in a channel.
    Simulation {
        /// Number of agents taking part.
        #[arg(long, default_value = "2")]
        agents: usize,

        /// Opening topic.
        #[arg(long)]
        topic: Option<String>,

        /// Number of turns after the opening message.
        #[arg(long, default_value = "3")]
        turns: u32,

        /// Shuffle the speaking order every turn.
        #[arg(long)]
        random_order: bool,

        /// Target channel.
        #[arg(long, env = "AGORA_CHANNEL")]
        channel: ChannelId,
    },

    /// Ask one persona a single question.
    Ask {
        /// Persona name (case-insensitive).
        persona: String,

        question: String,

        /// Target channel.
        #[arg(long, env = "AGORA_CHANNEL")]
        channel: ChannelId,
    },
}

#[derive(Subcommand)]
pub enum GlobalCommand {
    /// Delete the bot's identities in a channel.
    Cleanup {
        #[arg(long, env = "AGORA_CHANNEL")]
        channel: ChannelId,
    },

    /// Replace the system prompt; omit it to restore the default.
    SetSystemPrompt {
        prompt: Option<String>,
    },

    /// Model and sampling parameters.
    Parameters {
        #[command(subcommand)]
        action: ParametersCommand,
    },
}

#[derive(Subcommand)]
pub enum ParametersCommand {
    /// Change any subset of sampling parameters.
    Set {
        #[arg(long)]
        temperature: Option<f64>,

        /// Context window size.
        #[arg(long)]
        num_ctx: Option<u32>,

        #[arg(long)]
        top_k: Option<u32>,

        #[arg(long)]
        top_p: Option<f64>,

        #[arg(long)]
        repeat_penalty: Option<f64>,

        /// Maximum tokens to generate.
        #[arg(long, allow_negative_numbers = true)]
        num_predict: Option<i32>,
    },

    /// Show the current model, prompt and parameters.
    #[command(alias = "ls")]
    List,

    /// Switch the model.
    Model {
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_defaults() {
        let cli = Cli::try_parse_from(["agora", "agent", "simulation", "--channel", "42"]).unwrap();
        match cli.command {
            Commands::Agent {
                action:
                    AgentCommand::Simulation {
                        agents,
                        topic,
                        turns,
                        random_order,
                        channel,
                    },
            } => {
                assert_eq!(agents, 2);
                assert_eq!(turns, 3);
                assert!(topic.is_none());
                assert!(!random_order);
                assert_eq!(channel, ChannelId(42));
            }
            _ => panic!("expected agent simulation"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "agora", "global", "parameters", "set", "--temperature", "1.2", "--user", "77", "--json",
        ])
        .unwrap();
        assert_eq!(cli.user_key(), UserKey::new("77"));
        assert!(cli.json);
    }

    #[test]
    fn test_invalid_channel_rejected() {
        assert!(Cli::try_parse_from(["agora", "global", "cleanup", "--channel", "general"]).is_err());
    }
}
