//! Ghost Mode 中间页：最小化的线索收集表单
//!
//! 表单提交到 `/api/leads`，成功后跳转到返回的 `whatsappUrl`。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{debug, error};

use super::redirect::RedirectService;
use crate::config::StaticConfig;
use crate::storage::SeaOrmStorage;
use crate::utils::{UtmParams, is_valid_slug};

use migration::entities::link;

/// HTML 转义（属性值和文本节点都可用）
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn hidden_input(name: &str, value: Option<&str>) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        name,
        escape_html(value.unwrap_or_default())
    )
}

/// 渲染表单页面
pub fn render_form(link: &link::Model, utm: &UtmParams) -> String {
    let hidden = [
        hidden_input("linkId", Some(&link.id)),
        hidden_input("utmSource", utm.source.as_deref()),
        hidden_input("utmMedium", utm.medium.as_deref()),
        hidden_input("utmCampaign", utm.campaign.as_deref()),
        hidden_input("utmContent", utm.content.as_deref()),
        hidden_input("utmTerm", utm.term.as_deref()),
    ]
    .join("\n      ");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta name="robots" content="noindex">
  <title>Continue to WhatsApp</title>
</head>
<body>
  <main>
    <h1>Continue to WhatsApp</h1>
    <form id="lead-form" data-slug="{slug}">
      {hidden}
      <label>Name <input type="text" name="name" maxlength="100"></label>
      <label>Phone <input type="tel" name="phone" required maxlength="20"></label>
      <label>Email <input type="email" name="email" maxlength="255"></label>
      <button type="submit">Continue</button>
      <p id="lead-error" role="alert"></p>
    </form>
  </main>
  <script>
    document.getElementById("lead-form").addEventListener("submit", async function (e) {{
      e.preventDefault();
      var body = {{}};
      new FormData(e.target).forEach(function (v, k) {{ if (v !== "") body[k] = v; }});
      var res = await fetch("/api/leads", {{
        method: "POST",
        headers: {{ "Content-Type": "application/json" }},
        body: JSON.stringify(body)
      }});
      var data = await res.json();
      if (res.ok && data.whatsappUrl) {{
        window.location.href = data.whatsappUrl;
      }} else {{
        document.getElementById("lead-error").textContent =
          (data.error && data.error.message) || "Something went wrong";
      }}
    }});
  </script>
</body>
</html>"#,
        slug = escape_html(&link.slug),
        hidden = hidden,
    )
}

pub struct InterstitialService;

impl InterstitialService {
    /// GET {interstitial_prefix}/{slug}
    pub async fn show_form(
        req: HttpRequest,
        path: web::Path<String>,
        storage: web::Data<Arc<SeaOrmStorage>>,
        config: web::Data<Arc<StaticConfig>>,
    ) -> impl Responder {
        let slug = path.into_inner();
        let pages = &config.pages;

        if !is_valid_slug(&slug) {
            return RedirectService::found(&pages.not_found);
        }

        match storage.find_link_by_slug(&slug).await {
            Ok(Some(link)) if link.is_active => {
                let utm = UtmParams::resolve(req.uri().query(), &link);
                HttpResponse::build(StatusCode::OK)
                    .insert_header((CONTENT_TYPE, "text/html; charset=utf-8"))
                    .insert_header((CACHE_CONTROL, "no-store"))
                    .body(render_form(&link, &utm))
            }
            Ok(Some(_)) => RedirectService::found(&pages.inactive),
            Ok(None) => {
                debug!("Interstitial link not found: {}", &slug);
                RedirectService::found(&pages.not_found)
            }
            Err(e) => {
                error!("Database error during interstitial lookup: {}", e);
                RedirectService::found(&pages.error)
            }
        }
    }
}

pub fn interstitial_routes(prefix: &str) -> impl FnOnce(&mut web::ServiceConfig) {
    let path = format!("{}/{{slug}}", prefix.trim_end_matches('/'));
    move |cfg| {
        cfg.route(&path, web::get().to(InterstitialService::show_form));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script>&'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;&amp;&#x27;"
        );
    }

    #[test]
    fn test_form_escapes_utm_values() {
        let link = link::Model {
            id: "link-1".to_string(),
            slug: "promo".to_string(),
            user_id: "u1".to_string(),
            destination_number: "5511999998888".to_string(),
            message_template: String::new(),
            is_active: true,
            ghost_mode: true,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_content: None,
            click_count: 0,
            lead_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let utm = UtmParams {
            source: Some(r#""><script>"#.to_string()),
            ..Default::default()
        };

        let html = render_form(&link, &utm);
        assert!(html.contains(r#"name="linkId" value="link-1""#));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
        assert!(!html.contains(r#""><script>"#));
    }
}
