//! API 帮助函数
//!
//! 所有错误响应统一为 `{error: {message, code, details?}, requestId}`。

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use crate::api::middleware::RequestId;
use crate::errors::ZaplinkerError;

/// 当前请求的 ID（由 RequestIdMiddleware 注入）
pub fn request_id_of(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, data: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(data)
}

/// `/api` 下未匹配路由的兜底
pub async fn api_not_found(req: HttpRequest) -> HttpResponse {
    let err = ZaplinkerError::not_found(format!("No route for {} {}", req.method(), req.path()));
    error_response(&req, &err)
}

/// 从 ZaplinkerError 构建错误响应
///
/// 5xx 只记录日志，返回给客户端的是通用信息。
pub fn error_response(req: &HttpRequest, err: &ZaplinkerError) -> HttpResponse {
    let request_id = request_id_of(req);
    let status = err.http_status();

    if status.is_server_error() {
        error!(request_id = %request_id, "{}", err.format_simple());
    } else {
        warn!(request_id = %request_id, "{} {} -> {}", req.method(), req.path(), err.format_simple());
    }

    let mut body = json!({
        "message": err.public_message(),
        "code": err.code(),
    });
    if let Some(details) = err.details() {
        body["details"] = details.clone();
    }

    json_response(
        status,
        &json!({
            "error": body,
            "requestId": request_id,
        }),
    )
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T: Serialize>(
    req: &HttpRequest,
    status: StatusCode,
    result: crate::errors::Result<T>,
) -> HttpResponse {
    match result {
        Ok(data) => json_response(status, &data),
        Err(e) => error_response(req, &e),
    }
}

/// JSON body 反序列化失败 → VALIDATION_ERROR
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, req| {
            let zerr = ZaplinkerError::validation(format!("Invalid JSON body: {}", err));
            let response = error_response(req, &zerr);
            InternalError::from_response(err, response).into()
        })
}

/// Query 参数反序列化失败 → VALIDATION_ERROR
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        let zerr = ZaplinkerError::validation(format!("Invalid query parameters: {}", err));
        let response = error_response(req, &zerr);
        InternalError::from_response(err, response).into()
    })
}
