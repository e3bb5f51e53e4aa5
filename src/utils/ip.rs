//! 请求头解析工具
//!
//! - 客户端 IP：x-forwarded-for（第一个）→ x-real-ip → cf-connecting-ip → "unknown"
//! - Meta 像素标识：_fbp / _fbc cookie，缺少 _fbc 时由 fbclid 合成
//! - 边缘节点地理信息：Vercel / Cloudflare 注入的国家、城市头

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

pub const UNKNOWN_IP: &str = "unknown";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// 从 HeaderMap 提取客户端 IP
pub fn extract_client_ip_from_headers(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .or_else(|| header_str(headers, "cf-connecting-ip"))
        .unwrap_or(UNKNOWN_IP)
        .to_string()
}

/// 从 HttpRequest 提取客户端 IP
pub fn extract_client_ip(req: &HttpRequest) -> String {
    extract_client_ip_from_headers(req.headers())
}

/// 提取 Meta 像素的 fbp / fbc
///
/// `fbc` 缺失但 URL 带 `fbclid` 时按 `fb.1.<ms>.<fbclid>` 生成。
pub fn extract_fb_identifiers(
    req: &HttpRequest,
    now_millis: i64,
) -> (Option<String>, Option<String>) {
    let fbp = req.cookie("_fbp").map(|c| c.value().to_string());
    let fbc = req.cookie("_fbc").map(|c| c.value().to_string()).or_else(|| {
        query_param(req.query_string(), "fbclid").map(|id| format!("fb.1.{}.{}", now_millis, id))
    });
    (
        fbp.filter(|v| !v.is_empty()),
        fbc.filter(|v| !v.is_empty()),
    )
}

/// 边缘节点注入的地理信息（city, country）
pub fn extract_geo_from_headers(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let city = header_str(headers, "x-vercel-ip-city")
        .or_else(|| header_str(headers, "cf-ipcity"))
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        });
    let country = header_str(headers, "x-vercel-ip-country")
        .or_else(|| header_str(headers, "cf-ipcountry"))
        .filter(|c| *c != "XX")
        .map(|c| c.to_uppercase());
    (city, country)
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|part| part.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_takes_first_entry() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.9, 10.0.0.1"))
            .insert_header(("x-real-ip", "198.51.100.2"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn test_header_fallback_order() {
        let req = TestRequest::default()
            .insert_header(("x-real-ip", "198.51.100.2"))
            .insert_header(("cf-connecting-ip", "192.0.2.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "198.51.100.2");

        let req = TestRequest::default()
            .insert_header(("cf-connecting-ip", "192.0.2.1"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "192.0.2.1");

        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_client_ip(&req), UNKNOWN_IP);
    }

    #[test]
    fn test_fb_identifiers_from_cookies() {
        let req = TestRequest::default()
            .cookie(Cookie::new("_fbp", "fb.1.1700000000000.123"))
            .cookie(Cookie::new("_fbc", "fb.1.1700000000000.abc"))
            .to_http_request();
        let (fbp, fbc) = extract_fb_identifiers(&req, 42);
        assert_eq!(fbp.as_deref(), Some("fb.1.1700000000000.123"));
        assert_eq!(fbc.as_deref(), Some("fb.1.1700000000000.abc"));
    }

    #[test]
    fn test_fbc_synthesized_from_fbclid() {
        let req = TestRequest::with_uri("/l/promo?fbclid=IwAR0xyz&utm_source=fb").to_http_request();
        let (fbp, fbc) = extract_fb_identifiers(&req, 1700000000000);
        assert!(fbp.is_none());
        assert_eq!(fbc.as_deref(), Some("fb.1.1700000000000.IwAR0xyz"));
    }

    #[test]
    fn test_geo_headers() {
        let req = TestRequest::default()
            .insert_header(("x-vercel-ip-city", "S%C3%A3o%20Paulo"))
            .insert_header(("x-vercel-ip-country", "br"))
            .to_http_request();
        let (city, country) = extract_geo_from_headers(req.headers());
        assert_eq!(city.as_deref(), Some("São Paulo"));
        assert_eq!(country.as_deref(), Some("BR"));

        let req = TestRequest::default()
            .insert_header(("cf-ipcountry", "XX"))
            .to_http_request();
        let (city, country) = extract_geo_from_headers(req.headers());
        assert!(city.is_none());
        assert!(country.is_none());
    }
}
