use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, web};

use super::helpers::api_result;
use crate::services::{CreateLeadRequest, LeadService};

/// POST /api/leads（公开，无需登录）
pub async fn create_lead(
    req: HttpRequest,
    body: web::Json<CreateLeadRequest>,
    service: web::Data<LeadService>,
) -> impl Responder {
    let result = service.create_lead(body.into_inner()).await;
    api_result(&req, StatusCode::CREATED, result)
}

pub fn lead_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/leads", web::post().to(create_lead));
}
