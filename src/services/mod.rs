//! Service layer for business logic
//!
//! HTTP handlers stay thin and delegate to these services; every service
//! receives the storage handle explicitly.

mod analytics_service;
mod lead_service;
mod link_service;

pub use analytics_service::*;
pub use lead_service::*;
pub use link_service::*;
