//! CLI interface module
//!
//! 除 `serve` 以外的子命令：生成配置、创建用户、签发令牌、设置套餐。

pub mod commands;

use std::fmt;
use std::sync::Arc;

use crate::cli::Commands;
use crate::config::StaticConfig;
use crate::errors::ZaplinkerError;
use crate::storage::StorageFactory;
use commands::{config_generate, create_user, issue_token, set_plan};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<ZaplinkerError> for CliError {
    fn from(err: ZaplinkerError) -> Self {
        match err {
            ZaplinkerError::DatabaseConfig(_)
            | ZaplinkerError::DatabaseConnection(_)
            | ZaplinkerError::DatabaseOperation(_) => CliError::StorageError(err.to_string()),
            _ => CliError::CommandError(err.to_string()),
        }
    }
}

/// Run a CLI command from clap-parsed input
///
/// `Serve` 由 main 直接处理，不会进入这里。
pub async fn run_cli_command(cmd: Commands, config: Arc<StaticConfig>) -> Result<(), CliError> {
    // 生成配置不需要数据库
    if let Commands::GenerateConfig { output_path, force } = cmd {
        return config_generate(output_path, force);
    }

    let storage = StorageFactory::create(&config.database)
        .await
        .map_err(|e| CliError::StorageError(e.to_string()))?;

    match cmd {
        Commands::CreateUser { email, name } => create_user(storage, email, name).await,
        Commands::IssueToken { user_id } => issue_token(storage, &config, user_id).await,
        Commands::SetPlan {
            user_id,
            plan,
            max_links,
        } => set_plan(storage, user_id, plan, max_links).await,
        Commands::GenerateConfig { .. } => unreachable!("handled above"),
        Commands::Serve => unreachable!("Serve handled in main"),
    }
}
