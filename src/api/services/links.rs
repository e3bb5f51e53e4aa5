//! `/api/links` 端点
//!
//! 归属校验、参数校验都在 LinkService 中完成，这里只做 HTTP 映射。

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, web};
use serde_json::json;

use super::helpers::api_result;
use crate::api::middleware::AuthUser;
use crate::services::{
    BulkLinksRequest, CreateLinkRequest, LinkService, ListLinksQuery, UpdateLinkRequest,
};

/// GET /api/links
pub async fn list_links(
    req: HttpRequest,
    user: AuthUser,
    query: web::Query<ListLinksQuery>,
    service: web::Data<LinkService>,
) -> impl Responder {
    let result = service.list_links(&user.id, query.into_inner()).await;
    api_result(&req, StatusCode::OK, result)
}

/// POST /api/links
pub async fn create_link(
    req: HttpRequest,
    user: AuthUser,
    body: web::Json<CreateLinkRequest>,
    service: web::Data<LinkService>,
) -> impl Responder {
    let result = service.create_link(&user.id, body.into_inner()).await;
    api_result(&req, StatusCode::CREATED, result)
}

/// GET /api/links/{id}
pub async fn get_link(
    req: HttpRequest,
    user: AuthUser,
    path: web::Path<String>,
    service: web::Data<LinkService>,
) -> impl Responder {
    let result = service.get_link(&user.id, &path).await;
    api_result(&req, StatusCode::OK, result)
}

/// PATCH /api/links/{id}
pub async fn update_link(
    req: HttpRequest,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateLinkRequest>,
    service: web::Data<LinkService>,
) -> impl Responder {
    let result = service
        .update_link(&user.id, &path, body.into_inner())
        .await;
    api_result(&req, StatusCode::OK, result)
}

/// DELETE /api/links/{id}
pub async fn delete_link(
    req: HttpRequest,
    user: AuthUser,
    path: web::Path<String>,
    service: web::Data<LinkService>,
) -> impl Responder {
    let result = service
        .delete_link(&user.id, &path)
        .await
        .map(|_| json!({ "success": true, "id": path.as_str() }));
    api_result(&req, StatusCode::OK, result)
}

/// POST /api/links/bulk
pub async fn bulk_links(
    req: HttpRequest,
    user: AuthUser,
    body: web::Json<BulkLinksRequest>,
    service: web::Data<LinkService>,
) -> impl Responder {
    let result = service.bulk(&user.id, body.into_inner()).await;
    api_result(&req, StatusCode::OK, result)
}

/// 注册到已认证的 `/api` scope 下
pub fn link_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/links")
            .route("", web::get().to(list_links))
            .route("", web::post().to(create_link))
            // bulk 必须在 /{id} 之前注册
            .route("/bulk", web::post().to(bulk_links))
            .route("/{id}", web::get().to(get_link))
            .route("/{id}", web::patch().to(update_link))
            .route("/{id}", web::delete().to(delete_link)),
    );
}
