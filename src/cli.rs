//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for zaplinker using clap's derive macros.

use clap::{Parser, Subcommand};

use crate::storage::Plan;

/// Zaplinker - WhatsApp link tracker
#[derive(Parser)]
#[command(name = "zaplinker")]
#[command(version)]
#[command(about = "WhatsApp link tracker with lead capture and click analytics", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print an example configuration file
    GenerateConfig {
        /// Write to this path instead of stdout
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Create a user account
    CreateUser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: Option<String>,
    },

    /// Mint a session token for a user
    IssueToken {
        #[arg(long)]
        user_id: String,
    },

    /// Set a user's plan and link limit
    SetPlan {
        #[arg(long)]
        user_id: String,

        /// FREE, PRO or BUSINESS
        #[arg(long)]
        plan: Plan,

        #[arg(long)]
        max_links: i32,
    },
}
