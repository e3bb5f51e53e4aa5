//! 用户相关命令
//!
//! 用户账户和会话令牌通常由外部认证服务管理，这些命令用于本地开发和运维。

use std::sync::Arc;

use colored::Colorize;

use crate::api::jwt::JwtService;
use crate::config::StaticConfig;
use crate::interfaces::cli::CliError;
use crate::storage::{Plan, SeaOrmStorage};

pub async fn create_user(
    storage: Arc<SeaOrmStorage>,
    email: String,
    name: Option<String>,
) -> Result<(), CliError> {
    let user = storage.create_user(email.trim(), name.as_deref()).await?;

    println!("{} {}", "User created:".green(), user.id.cyan());
    println!("  email: {}", user.email);
    Ok(())
}

pub async fn issue_token(
    storage: Arc<SeaOrmStorage>,
    config: &StaticConfig,
    user_id: String,
) -> Result<(), CliError> {
    if storage.find_user(&user_id).await?.is_none() {
        return Err(CliError::CommandError(format!("User not found: {}", user_id)));
    }

    // 随机 secret 签出的令牌对运行中的服务无效
    if config.auth.jwt_secret.is_empty() {
        return Err(CliError::CommandError(
            "auth.jwt_secret is not configured, the server could not verify this token"
                .to_string(),
        ));
    }

    let jwt = JwtService::from_config(&config.auth);
    let token = jwt
        .issue(&user_id)
        .map_err(|e| CliError::CommandError(format!("Failed to sign token: {}", e)))?;

    println!("{}", token);
    Ok(())
}

pub async fn set_plan(
    storage: Arc<SeaOrmStorage>,
    user_id: String,
    plan: Plan,
    max_links: i32,
) -> Result<(), CliError> {
    if max_links < 0 {
        return Err(CliError::CommandError(
            "--max-links must not be negative".to_string(),
        ));
    }
    if storage.find_user(&user_id).await?.is_none() {
        return Err(CliError::CommandError(format!("User not found: {}", user_id)));
    }

    storage.upsert_usage_limit(&user_id, plan, max_links).await?;

    println!(
        "{} {} -> {} ({} links)",
        "Plan updated:".green(),
        user_id.cyan(),
        plan.as_ref().bold(),
        max_links
    );
    Ok(())
}
