use actix_web::http::StatusCode;
use actix_web::{Responder, web};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, trace};

use super::helpers::json_response;
use crate::storage::SeaOrmStorage;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    /// 运行秒数
    pub uptime: u64,
    pub database: DatabaseHealth,
}

/// Health Service
///
/// 直接 ping 数据库，不经过业务 service。
pub struct HealthService;

impl HealthService {
    /// GET /health
    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        trace!("Received health check request");

        let backend = storage.get_backend_name().to_string();
        let database = match tokio::time::timeout(Duration::from_secs(5), storage.ping()).await {
            Ok(Ok(())) => DatabaseHealth {
                status: "healthy",
                backend,
                error: None,
            },
            Ok(Err(e)) => {
                error!("Database health check failed: {}", e);
                DatabaseHealth {
                    status: "unhealthy",
                    backend,
                    error: Some("database error".to_string()),
                }
            }
            Err(_) => {
                error!("Database health check timeout");
                DatabaseHealth {
                    status: "unhealthy",
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        };

        let now = chrono::Utc::now();
        let healthy = database.status == "healthy";
        let body = HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" },
            timestamp: now.to_rfc3339(),
            uptime: (now - app_start_time.start_datetime).num_seconds().max(0) as u64,
            database,
        };

        let status = if healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        json_response(status, &body)
    }
}

pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(HealthService::health_check));
}
