//! HTTP 层
//!
//! - `middleware`: request id、会话认证
//! - `services`: 各端点的 handler 与路由注册
//! - `jwt`: 会话令牌签发与校验

pub mod jwt;
pub mod middleware;
pub mod services;

use actix_web::web;
use std::sync::Arc;

use crate::config::StaticConfig;
use crate::services::{AnalyticsService, LeadService, LinkService};
use crate::storage::SeaOrmStorage;
use jwt::JwtService;
use middleware::SessionAuth;
use services::helpers::{api_not_found, json_config, query_config};
use services::{
    AppStartTime, analytics_routes, health_routes, interstitial_routes, lead_routes, link_routes,
    redirect_routes,
};

/// 所有 worker 共享的应用状态
///
/// 在 `HttpServer::new` 之前构建一次，每个 worker 克隆一份（只克隆 Arc）。
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub config: Arc<StaticConfig>,
    pub jwt: Arc<JwtService>,
    pub link_service: web::Data<LinkService>,
    pub lead_service: web::Data<LeadService>,
    pub analytics_service: web::Data<AnalyticsService>,
    pub start_time: AppStartTime,
}

impl AppState {
    pub fn new(storage: Arc<SeaOrmStorage>, config: Arc<StaticConfig>) -> Self {
        let jwt = Arc::new(JwtService::from_config(&config.auth));
        Self::with_jwt(storage, config, jwt)
    }

    /// 使用外部提供的 JwtService（测试中用固定 secret 签发令牌）
    pub fn with_jwt(
        storage: Arc<SeaOrmStorage>,
        config: Arc<StaticConfig>,
        jwt: Arc<JwtService>,
    ) -> Self {
        let link_service = web::Data::new(LinkService::new(
            storage.clone(),
            config.limits.free_max_links,
        ));
        let lead_service = web::Data::new(LeadService::new(storage.clone()));
        let analytics_service = web::Data::new(AnalyticsService::new(
            storage.clone(),
            config.analytics.clone(),
        ));

        Self {
            storage,
            config,
            jwt,
            link_service,
            lead_service,
            analytics_service,
            start_time: AppStartTime {
                start_datetime: chrono::Utc::now(),
            },
        }
    }
}

/// 注册全部路由和共享数据
///
/// 公开路由（health、重定向、中间页、线索提交）必须在 `/api` scope 之前注册，
/// 否则 `/api/leads` 会被认证 scope 吞掉。
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let interstitial_prefix = state.config.pages.interstitial_prefix.clone();
        let cookie_name = state.config.auth.cookie_name.clone();

        cfg.app_data(web::Data::new(state.storage.clone()))
            .app_data(web::Data::new(state.config.clone()))
            .app_data(web::Data::new(state.start_time.clone()))
            .app_data(state.link_service.clone())
            .app_data(state.lead_service.clone())
            .app_data(state.analytics_service.clone())
            .app_data(json_config())
            .app_data(query_config())
            .configure(health_routes)
            .configure(redirect_routes)
            .configure(interstitial_routes(&interstitial_prefix))
            .configure(lead_routes)
            .service(
                web::scope("/api")
                    .wrap(SessionAuth::new(state.jwt.clone(), &cookie_name))
                    .configure(link_routes)
                    .configure(analytics_routes)
                    .default_service(web::to(api_not_found)),
            );
    }
}
