//! Analytics API 端点
//!
//! 所有端点都要求 `dateRange ∈ {7, 30, 90}`，缺省 30。

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, web};
use serde::Deserialize;

use super::helpers::{api_result, error_response};
use crate::api::middleware::AuthUser;
use crate::services::{AnalyticsService, DateRange, LinkService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub date_range: Option<String>,
    pub link_id: Option<String>,
}

/// GET /api/overview
pub async fn get_overview(
    req: HttpRequest,
    user: AuthUser,
    query: web::Query<AnalyticsQuery>,
    service: web::Data<AnalyticsService>,
) -> impl Responder {
    let range = match DateRange::parse(query.date_range.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&req, &e),
    };

    let result = service.overview(&user.id, range).await;
    api_result(&req, StatusCode::OK, result)
}

/// GET /api/analytics
pub async fn get_analytics(
    req: HttpRequest,
    user: AuthUser,
    query: web::Query<AnalyticsQuery>,
    service: web::Data<AnalyticsService>,
    links: web::Data<LinkService>,
) -> impl Responder {
    let range = match DateRange::parse(query.date_range.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&req, &e),
    };

    let link_id = query.link_id.as_deref().filter(|id| !id.is_empty());
    if let Some(id) = link_id
        && let Err(e) = links.owned_link(&user.id, id).await
    {
        return error_response(&req, &e);
    }

    let result = service.report(&user.id, link_id, range).await;
    api_result(&req, StatusCode::OK, result)
}

/// GET /api/analytics/links
pub async fn get_links_analytics(
    req: HttpRequest,
    user: AuthUser,
    query: web::Query<AnalyticsQuery>,
    service: web::Data<AnalyticsService>,
) -> impl Responder {
    let range = match DateRange::parse(query.date_range.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_response(&req, &e),
    };

    let result = service.links_performance(&user.id, range).await;
    api_result(&req, StatusCode::OK, result)
}

pub fn analytics_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/overview", web::get().to(get_overview))
        .route("/analytics", web::get().to(get_analytics))
        .route("/analytics/links", web::get().to(get_links_analytics));
}
