use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, LOCATION, REFERER, USER_AGENT};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use tracing::{debug, error, trace};

use crate::config::{PagesConfig, StaticConfig};
use crate::storage::{NewClick, SeaOrmStorage};
use crate::utils::ip::{extract_client_ip, extract_fb_identifiers, extract_geo_from_headers};
use crate::utils::{
    UtmParams, build_whatsapp_url, detect_device_type, is_valid_slug, truncate_chars,
};

use migration::entities::link;

// clicks 表的列长度
const MAX_IP_LEN: usize = 64;
const MAX_FB_ID_LEN: usize = 255;
const MAX_CITY_LEN: usize = 100;
const MAX_COUNTRY_LEN: usize = 64;

pub struct RedirectService {}

impl RedirectService {
    /// GET /l/{slug}
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        config: web::Data<Arc<StaticConfig>>,
    ) -> impl Responder {
        let slug = path.into_inner();
        let pages = &config.pages;

        if !is_valid_slug(&slug) {
            // 非法 slug 不查库
            trace!("Invalid slug rejected: {}", &slug);
            return Self::found(&pages.not_found);
        }

        let link = match storage.find_link_by_slug(&slug).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                debug!("Redirect link not found: {}", &slug);
                return Self::found(&pages.not_found);
            }
            Err(e) => {
                error!("Database error during redirect lookup: {}", e);
                return Self::found(&pages.error);
            }
        };

        if !link.is_active {
            debug!("Redirect link inactive: {}", &slug);
            return Self::found(&pages.inactive);
        }

        // query 值截断到列长度上限
        let utm = UtmParams::resolve(req.uri().query(), &link).capped();
        let click = Self::build_click(&req, &link, &utm);

        // 点击写入失败时不跳转到 WhatsApp，事务已整体回滚
        if let Err(e) = storage.record_click(&click).await {
            error!("Failed to record click for {}: {}", &slug, e);
            return Self::found(&pages.error);
        }

        Self::finish_redirect(&link, &utm, pages)
    }

    /// 从请求中提取一次点击的全部信息
    fn build_click(req: &HttpRequest, link: &link::Model, utm: &UtmParams) -> NewClick {
        let now = Utc::now();
        let header = |name| {
            req.headers()
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(String::from)
                .filter(|s| !s.is_empty())
        };
        let cap = |value: Option<String>, max: usize| value.map(|v| truncate_chars(v, max));
        let user_agent = header(USER_AGENT);
        let (fbp, fbc) = extract_fb_identifiers(req, now.timestamp_millis());
        let (city, country) = extract_geo_from_headers(req.headers());

        NewClick {
            link_id: link.id.clone(),
            user_id: link.user_id.clone(),
            timestamp: now,
            ip_address: Some(truncate_chars(extract_client_ip(req), MAX_IP_LEN)),
            device: detect_device_type(user_agent.as_deref()),
            user_agent,
            referrer: header(REFERER),
            utm: utm.clone(),
            fbp: cap(fbp, MAX_FB_ID_LEN),
            fbc: cap(fbc, MAX_FB_ID_LEN),
            city: cap(city, MAX_CITY_LEN),
            country: cap(country, MAX_COUNTRY_LEN),
        }
    }

    fn finish_redirect(link: &link::Model, utm: &UtmParams, pages: &PagesConfig) -> HttpResponse {
        if link.ghost_mode {
            let query = utm.to_query_string();
            let location = if query.is_empty() {
                format!("{}/{}", pages.interstitial_prefix, link.slug)
            } else {
                format!("{}/{}?{}", pages.interstitial_prefix, link.slug, query)
            };
            return Self::found(&location);
        }

        let target = build_whatsapp_url(&link.destination_number, &link.message_template, utm);
        Self::found(&target)
    }

    /// 302，不缓存（每次访问都要记录点击）
    pub fn found(location: &str) -> HttpResponse {
        HttpResponse::build(StatusCode::FOUND)
            .insert_header((LOCATION, location))
            .insert_header((CACHE_CONTROL, "no-store"))
            .finish()
    }
}

pub fn redirect_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/l/{slug}", web::get().to(RedirectService::handle_redirect));
}
