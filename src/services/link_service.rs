//! Link management service
//!
//! Provides the business logic behind `/api/links`: ownership checks,
//! request validation, plan limits and bulk operations.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::errors::{Result, ZaplinkerError};
use crate::storage::{LinkFilter, LinkPatch, LinkStatus, NewLink, SeaOrmStorage};
use crate::utils::{RANDOM_SLUG_LENGTH, UtmParams, generate_random_code, is_valid_slug, normalize_phone};

use migration::entities::link;

/// 单次批量操作的最大 ID 数
pub const MAX_BULK_IDS: usize = 100;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

const SLUG_GENERATION_ATTEMPTS: usize = 5;

// ============ Validators ============

fn validate_slug(slug: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("Slug must be 3-50 characters of letters, digits, '-' or '_'".into());
        Err(err)
    }
}

fn validate_destination(number: &str) -> std::result::Result<(), ValidationError> {
    let digits = normalize_phone(number);
    if (8..=15).contains(&digits.len()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("destination_number");
        err.message = Some("Destination number must contain 8-15 digits".into());
        Err(err)
    }
}

// ============ Request/Response DTOs ============

/// 链接上保存的默认 UTM（没有 term）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DefaultUtm {
    #[validate(length(max = 255))]
    pub source: Option<String>,
    #[validate(length(max = 255))]
    pub medium: Option<String>,
    #[validate(length(max = 255))]
    pub campaign: Option<String>,
    #[validate(length(max = 255))]
    pub content: Option<String>,
}

impl DefaultUtm {
    fn into_params(self) -> UtmParams {
        // 空串视为未设置
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        UtmParams {
            source: clean(self.source),
            medium: clean(self.medium),
            campaign: clean(self.campaign),
            content: clean(self.content),
            term: None,
        }
    }
}

impl From<&link::Model> for DefaultUtm {
    fn from(model: &link::Model) -> Self {
        Self {
            source: model.utm_source.clone(),
            medium: model.utm_medium.clone(),
            campaign: model.utm_campaign.clone(),
            content: model.utm_content.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    /// 不填则自动生成
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    #[validate(custom = "validate_destination")]
    pub destination_number: String,
    #[validate(length(max = 1000, message = "Message template must be at most 1000 characters"))]
    pub message_template: Option<String>,
    pub is_active: Option<bool>,
    pub ghost_mode: Option<bool>,
    #[validate]
    pub default_utm: Option<DefaultUtm>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    #[validate(custom = "validate_destination")]
    pub destination_number: Option<String>,
    #[validate(length(max = 1000, message = "Message template must be at most 1000 characters"))]
    pub message_template: Option<String>,
    pub is_active: Option<bool>,
    pub ghost_mode: Option<bool>,
    #[validate]
    pub default_utm: Option<DefaultUtm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLinksQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub status: Option<LinkStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Activate,
    Deactivate,
    Delete,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkLinksRequest {
    pub action: BulkAction,
    #[validate(length(min = 1, max = 100, message = "linkIds must contain 1-100 ids"))]
    pub link_ids: Vec<String>,
}

/// API 返回的链接
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkView {
    pub id: String,
    pub slug: String,
    pub destination_number: String,
    pub message_template: String,
    pub is_active: bool,
    pub ghost_mode: bool,
    pub default_utm: DefaultUtm,
    pub click_count: i64,
    pub lead_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<link::Model> for LinkView {
    fn from(model: link::Model) -> Self {
        Self {
            default_utm: DefaultUtm::from(&model),
            id: model.id,
            slug: model.slug,
            destination_number: model.destination_number,
            message_template: model.message_template,
            is_active: model.is_active,
            ghost_mode: model.ghost_mode,
            click_count: model.click_count,
            lead_count: model.lead_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkPage {
    pub links: Vec<LinkView>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub code: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkResult {
    pub action: BulkAction,
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

// ============ LinkService ============

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    free_max_links: i32,
}

impl LinkService {
    pub fn new(storage: Arc<SeaOrmStorage>, free_max_links: i32) -> Self {
        Self {
            storage,
            free_max_links,
        }
    }

    /// 取出链接并校验归属：不存在 404，不属于当前用户 403
    pub async fn owned_link(&self, user_id: &str, link_id: &str) -> Result<link::Model> {
        let link = self
            .storage
            .find_link_by_id(link_id)
            .await?
            .ok_or_else(|| ZaplinkerError::not_found(format!("Link not found: {}", link_id)))?;

        if link.user_id != user_id {
            warn!("User {} tried to access link {} owned by another user", user_id, link_id);
            return Err(ZaplinkerError::forbidden("You do not have access to this link"));
        }
        Ok(link)
    }

    pub async fn list_links(&self, user_id: &str, query: ListLinksQuery) -> Result<LinkPage> {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let filter = LinkFilter {
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            status: query.status,
        };

        let (models, total) = self
            .storage
            .list_links_for_user(user_id, page, page_size, &filter)
            .await?;

        Ok(LinkPage {
            links: models.into_iter().map(LinkView::from).collect(),
            pagination: Pagination {
                page,
                page_size,
                total,
                total_pages: total.div_ceil(page_size),
            },
        })
    }

    pub async fn create_link(&self, user_id: &str, req: CreateLinkRequest) -> Result<LinkView> {
        req.validate()?;

        if self.storage.find_user(user_id).await?.is_none() {
            return Err(ZaplinkerError::unauthorized("User account not found"));
        }

        let max_links = self.max_links_for(user_id).await?;
        let current = self.storage.count_links_for_user(user_id).await?;
        if current >= max_links.max(0) as u64 {
            return Err(ZaplinkerError::plan_limit_reached(format!(
                "Plan limit of {} links reached",
                max_links
            )));
        }

        let slug = match req.slug {
            Some(slug) => {
                if self.storage.find_link_by_slug(&slug).await?.is_some() {
                    return Err(ZaplinkerError::duplicate_slug(format!(
                        "Slug '{}' is already taken",
                        slug
                    )));
                }
                slug
            }
            None => self.generate_unique_slug().await?,
        };

        let new_link = NewLink {
            slug,
            user_id: user_id.to_string(),
            destination_number: normalize_phone(&req.destination_number),
            message_template: req.message_template.unwrap_or_default(),
            is_active: req.is_active.unwrap_or(true),
            ghost_mode: req.ghost_mode.unwrap_or(false),
            default_utm: req.default_utm.unwrap_or_default().into_params(),
        };

        let model = self.storage.create_link(&new_link).await?;
        info!("User {} created link {} ({})", user_id, model.id, model.slug);
        Ok(model.into())
    }

    pub async fn get_link(&self, user_id: &str, link_id: &str) -> Result<LinkView> {
        Ok(self.owned_link(user_id, link_id).await?.into())
    }

    pub async fn update_link(
        &self,
        user_id: &str,
        link_id: &str,
        req: UpdateLinkRequest,
    ) -> Result<LinkView> {
        let current = self.owned_link(user_id, link_id).await?;
        req.validate()?;

        if let Some(ref slug) = req.slug
            && *slug != current.slug
            && self.storage.find_link_by_slug(slug).await?.is_some()
        {
            return Err(ZaplinkerError::duplicate_slug(format!(
                "Slug '{}' is already taken",
                slug
            )));
        }

        let patch = LinkPatch {
            slug: req.slug,
            destination_number: req.destination_number.as_deref().map(normalize_phone),
            message_template: req.message_template,
            is_active: req.is_active,
            ghost_mode: req.ghost_mode,
            default_utm: req.default_utm.map(DefaultUtm::into_params),
        };

        if patch.is_empty() {
            return Ok(current.into());
        }

        Ok(self.storage.update_link(current, &patch).await?.into())
    }

    pub async fn delete_link(&self, user_id: &str, link_id: &str) -> Result<()> {
        self.owned_link(user_id, link_id).await?;
        self.storage.delete_link(link_id).await
    }

    /// 批量操作：逐个校验归属，只对通过校验的 ID 执行
    pub async fn bulk(&self, user_id: &str, req: BulkLinksRequest) -> Result<BulkResult> {
        req.validate()?;

        let mut seen = HashSet::new();
        let ids: Vec<String> = req
            .link_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let found = self.storage.find_links_by_ids(&ids).await?;

        let mut allowed = Vec::new();
        let mut failed = Vec::new();
        for id in ids {
            match found.iter().find(|l| l.id == id) {
                None => failed.push(BulkFailure {
                    reason: "Link not found".to_string(),
                    code: "NOT_FOUND",
                    id,
                }),
                Some(l) if l.user_id != user_id => failed.push(BulkFailure {
                    reason: "You do not have access to this link".to_string(),
                    code: "FORBIDDEN",
                    id,
                }),
                Some(_) => allowed.push(id),
            }
        }

        if !allowed.is_empty() {
            match req.action {
                BulkAction::Activate => self.storage.set_links_active(&allowed, true).await?,
                BulkAction::Deactivate => self.storage.set_links_active(&allowed, false).await?,
                BulkAction::Delete => self.storage.delete_links(&allowed).await?,
            };
        }

        info!(
            "Bulk {:?} by {}: {} succeeded, {} failed",
            req.action,
            user_id,
            allowed.len(),
            failed.len()
        );

        Ok(BulkResult {
            action: req.action,
            succeeded: allowed,
            failed,
        })
    }

    /// 套餐允许的最大链接数：无记录时使用免费套餐默认值
    async fn max_links_for(&self, user_id: &str) -> Result<i32> {
        Ok(self
            .storage
            .find_usage_limit(user_id)
            .await?
            .map(|limit| limit.max_links)
            .unwrap_or(self.free_max_links))
    }

    async fn generate_unique_slug(&self) -> Result<String> {
        for _ in 0..SLUG_GENERATION_ATTEMPTS {
            let slug = generate_random_code(RANDOM_SLUG_LENGTH);
            if self.storage.find_link_by_slug(&slug).await?.is_none() {
                return Ok(slug);
            }
        }
        Err(ZaplinkerError::internal("Failed to generate a unique slug"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req(slug: Option<&str>, number: &str) -> CreateLinkRequest {
        CreateLinkRequest {
            slug: slug.map(str::to_string),
            destination_number: number.to_string(),
            message_template: None,
            is_active: None,
            ghost_mode: None,
            default_utm: None,
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert!(create_req(Some("promo-1"), "+55 (11) 99999-8888").validate().is_ok());
        assert!(create_req(None, "5511999998888").validate().is_ok());
        assert!(create_req(Some("a b"), "5511999998888").validate().is_err());
        assert!(create_req(Some("promo"), "1234").validate().is_err());
        assert!(create_req(Some("promo"), "1234567890123456").validate().is_err());
    }

    #[test]
    fn test_template_and_utm_limits() {
        let mut req = create_req(None, "5511999998888");
        req.message_template = Some("x".repeat(1001));
        assert!(req.validate().is_err());

        let mut req = create_req(None, "5511999998888");
        req.default_utm = Some(DefaultUtm {
            source: Some("s".repeat(256)),
            ..Default::default()
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bulk_request_limits() {
        let req = BulkLinksRequest {
            action: BulkAction::Delete,
            link_ids: vec![],
        };
        assert!(req.validate().is_err());

        let req = BulkLinksRequest {
            action: BulkAction::Activate,
            link_ids: (0..=MAX_BULK_IDS).map(|i| i.to_string()).collect(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_default_utm_drops_empty_values() {
        let params = DefaultUtm {
            source: Some("ig".to_string()),
            medium: Some(String::new()),
            ..Default::default()
        }
        .into_params();
        assert_eq!(params.source.as_deref(), Some("ig"));
        assert!(params.medium.is_none());
        assert!(params.term.is_none());
    }
}
