//! Lead capture service (Ghost Mode interstitial submissions)

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError};

use crate::errors::{Result, ZaplinkerError};
use crate::storage::{NewLead, SeaOrmStorage};
use crate::utils::{UtmParams, build_whatsapp_url, normalize_phone};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s().-]{8,20}$").expect("phone regex is valid"));

/// 邮箱可以为空串，非空时必须合法
fn validate_optional_email(email: &str) -> std::result::Result<(), ValidationError> {
    if email.trim().is_empty() || validator::validate_email(email.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Email is invalid".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, message = "linkId is required"))]
    pub link_id: String,
    #[validate(regex(path = "PHONE_RE", message = "Phone number is invalid"))]
    pub phone: String,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(custom = "validate_optional_email")]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub utm_source: Option<String>,
    #[validate(length(max = 255))]
    pub utm_medium: Option<String>,
    #[validate(length(max = 255))]
    pub utm_campaign: Option<String>,
    #[validate(length(max = 255))]
    pub utm_content: Option<String>,
    #[validate(length(max = 255))]
    pub utm_term: Option<String>,
}

impl CreateLeadRequest {
    fn submitted_utm(&self) -> UtmParams {
        UtmParams {
            source: self.utm_source.clone(),
            medium: self.utm_medium.clone(),
            campaign: self.utm_campaign.clone(),
            content: self.utm_content.clone(),
            term: self.utm_term.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCreated {
    pub success: bool,
    pub lead_id: String,
    pub whatsapp_url: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct LeadService {
    storage: Arc<SeaOrmStorage>,
}

impl LeadService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn create_lead(&self, req: CreateLeadRequest) -> Result<LeadCreated> {
        req.validate()?;

        let phone = normalize_phone(&req.phone);
        if phone.is_empty() {
            return Err(ZaplinkerError::validation_with_details(
                "Request validation failed",
                serde_json::json!({ "phone": [{ "code": "phone", "message": "Phone number is invalid" }] }),
            ));
        }

        let link = self
            .storage
            .find_link_by_id(&req.link_id)
            .await?
            .ok_or_else(|| ZaplinkerError::not_found(format!("Link not found: {}", req.link_id)))?;

        if !link.is_active {
            return Err(ZaplinkerError::link_inactive("This link is no longer active"));
        }

        let utm = req
            .submitted_utm()
            .or(&UtmParams::from_link_defaults(&link));

        let lead = self
            .storage
            .record_lead(&NewLead {
                link_id: link.id.clone(),
                user_id: link.user_id.clone(),
                phone,
                name: non_blank(req.name),
                email: non_blank(req.email),
                utm: utm.clone(),
                converted_at: Utc::now(),
            })
            .await?;

        info!("Lead {} captured for link {}", lead.id, link.slug);

        Ok(LeadCreated {
            success: true,
            lead_id: lead.id,
            whatsapp_url: build_whatsapp_url(&link.destination_number, &link.message_template, &utm),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateLeadRequest {
        CreateLeadRequest {
            link_id: "link-1".to_string(),
            phone: "+55 (11) 99999-8888".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_lead_request() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_phone_format() {
        for phone in ["1234567", "abc12345678", "+55 11 9999 8888 7777 66"] {
            let req = CreateLeadRequest {
                phone: phone.to_string(),
                ..valid_request()
            };
            let errors = req.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("phone"), "{}", phone);
        }
    }

    #[test]
    fn test_email_may_be_empty() {
        let mut req = valid_request();
        req.email = Some(String::new());
        assert!(req.validate().is_ok());

        req.email = Some("lead@example.com".to_string());
        assert!(req.validate().is_ok());

        req.email = Some("not-an-email".to_string());
        assert!(req.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn test_length_limits() {
        let mut req = valid_request();
        req.name = Some("n".repeat(101));
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.utm_campaign = Some("c".repeat(256));
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.link_id = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validation_errors_map_to_validation_code() {
        let mut req = valid_request();
        req.phone = "12".to_string();
        let err: ZaplinkerError = req.validate().unwrap_err().into();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.details().is_some());
    }
}
