use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::AppState;
use crate::config::StaticConfig;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub state: AppState,
}

/// 准备服务器启动的上下文
///
/// 连接数据库、执行迁移，然后构建各 service 共享的 AppState。
pub async fn prepare_server_startup(config: Arc<StaticConfig>) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.get_backend_name());

    let state = AppState::new(storage.clone(), config);

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext { storage, state })
}
