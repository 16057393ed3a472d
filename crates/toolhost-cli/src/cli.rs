//! Command-line definition

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "toolhost",
    version,
    about = "Chat with an LLM that can call tools on MCP servers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session on the terminal.
    Chat {
        /// Path to the MCP servers config file (JSON or YAML).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Serve the session over HTTP (`POST /query`).
    Serve {
        /// Path to the MCP servers config file (JSON or YAML).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on.
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },

    /// Connect to every configured server and print its tools.
    Tools {
        /// Path to the MCP servers config file (JSON or YAML).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
