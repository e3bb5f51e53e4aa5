//! Server mode
//!
//! This module contains the HTTP server startup logic.

use actix_cors::Cors;
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, middleware::Compress};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, warn};

use crate::api::configure;
use crate::api::middleware::{REQUEST_ID_HEADER, RequestIdMiddleware};
use crate::config::{CorsConfig, StaticConfig};
use crate::runtime::lifetime;

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec![
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .expose_headers(vec![REQUEST_ID_HEADER])
        .max_age(cors_config.max_age);

    // 空列表 = 仅同源
    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup(config.clone())
        .await
        .map_err(|e| {
            error!("Server startup failed: {}", e);
            e
        })?;

    let state = startup.state;
    let db_for_shutdown = startup.storage.get_db().clone();

    if config.cors.allowed_origins.is_empty() {
        warn!("CORS allowed_origins is empty, cross-origin lead submissions will be rejected");
    }

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&cors_config))
            .wrap(Compress::default())
            .configure(configure(state.clone()))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(bind_address)?.run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(&db_for_shutdown) => {
            warn!("Graceful shutdown completed");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{HttpResponse, test, web};

    #[actix_rt::test]
    async fn test_cors_allows_any_origin_by_default() {
        let cors = build_cors_middleware(&CorsConfig::default());
        let app = test::init_service(
            App::new()
                .wrap(cors)
                .route("/api/leads", web::post().to(HttpResponse::Created)),
        )
        .await;

        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/api/leads")
            .insert_header((header::ORIGIN, "https://landing.example.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert!(
            resp.headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
