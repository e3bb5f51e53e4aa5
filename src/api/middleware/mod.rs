pub mod auth;
pub mod request_id;

pub use auth::{AuthUser, SessionAuth};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdMiddleware};
