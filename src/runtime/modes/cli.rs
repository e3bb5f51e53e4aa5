//! CLI mode
//!
//! Delegates to the actual CLI implementation.

use std::sync::Arc;

use crate::cli::Commands;
use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;

pub async fn run_cli(cmd: Commands, config: Arc<StaticConfig>) -> Result<(), CliError> {
    crate::interfaces::cli::run_cli_command(cmd, config).await
}
