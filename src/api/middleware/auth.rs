//! Session authentication middleware
//!
//! 挂在需要登录的 `/api` scope 上：从 `Authorization: Bearer` 或会话 cookie
//! 读取 JWT，校验通过后把 `AuthUser` 放进 request extensions。

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    error::InternalError,
    http::header::AUTHORIZATION,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::api::jwt::JwtService;
use crate::api::services::helpers::error_response;
use crate::errors::ZaplinkerError;

/// 已认证用户
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().cloned();
        ready(user.ok_or_else(|| {
            let err = ZaplinkerError::unauthorized("Authentication required");
            InternalError::from_response("unauthorized", error_response(req, &err)).into()
        }))
    }
}

/// Session authentication middleware
#[derive(Clone)]
pub struct SessionAuth {
    jwt: Arc<JwtService>,
    cookie_name: Rc<str>,
}

impl SessionAuth {
    pub fn new(jwt: Arc<JwtService>, cookie_name: &str) -> Self {
        Self {
            jwt,
            cookie_name: Rc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            jwt: self.jwt.clone(),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    jwt: Arc<JwtService>,
    cookie_name: Rc<str>,
}

/// 从 Authorization header 提取 Bearer token
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        // Bearer 优先，其次 cookie
        let token = extract_bearer_token(&req)
            .or_else(|| req.cookie(&self.cookie_name).map(|c| c.value().to_string()));

        let claims = match token {
            Some(token) => self.jwt.validate(&token).map_err(|e| {
                debug!("Session token rejected: {}", e);
                ZaplinkerError::unauthorized("Invalid or expired session")
            }),
            None => Err(ZaplinkerError::unauthorized("Authentication required")),
        };

        Box::pin(async move {
            match claims {
                Ok(claims) => {
                    trace!("Authenticated user {}", claims.sub);
                    req.extensions_mut().insert(AuthUser { id: claims.sub });
                    let res = srv.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    let response = error_response(req.request(), &err);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
