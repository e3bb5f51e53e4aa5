//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations except the
//! click/lead append path (see `tracking`).

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, SqlErr, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{apply_patch, new_link_to_active_model};
use crate::errors::{Result, ZaplinkerError};
use crate::storage::models::{LinkPatch, NewLink, Plan};

use migration::entities::{click, lead, link, usage_limit, user};

/// 批量操作结果：实际受影响的行数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub affected: u64,
}

/// 唯一约束冲突 → DUPLICATE_SLUG，其余按数据库错误处理
fn map_slug_conflict(err: DbErr, slug: &str) -> ZaplinkerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ZaplinkerError::duplicate_slug(format!("Slug '{}' is already taken", slug))
        }
        _ => ZaplinkerError::from(err),
    }
}

impl SeaOrmStorage {
    pub async fn create_link(&self, new_link: &NewLink) -> Result<link::Model> {
        let model = new_link_to_active_model(new_link)
            .insert(&self.db)
            .await
            .map_err(|e| map_slug_conflict(e, &new_link.slug))?;

        info!("Link created: {} -> {}", model.slug, model.destination_number);
        Ok(model)
    }

    pub async fn update_link(&self, current: link::Model, patch: &LinkPatch) -> Result<link::Model> {
        let new_slug = patch.slug.clone().unwrap_or_else(|| current.slug.clone());
        let model = apply_patch(current, patch)
            .update(&self.db)
            .await
            .map_err(|e| map_slug_conflict(e, &new_slug))?;

        info!("Link updated: {}", model.id);
        Ok(model)
    }

    /// 删除链接及其全部点击、线索（单事务）
    pub async fn delete_link(&self, link_id: &str) -> Result<()> {
        let txn = self.db.begin().await?;

        let clicks = click::Entity::delete_many()
            .filter(click::Column::LinkId.eq(link_id))
            .exec(&txn)
            .await?;
        let leads = lead::Entity::delete_many()
            .filter(lead::Column::LinkId.eq(link_id))
            .exec(&txn)
            .await?;
        let result = link::Entity::delete_by_id(link_id).exec(&txn).await?;

        if result.rows_affected == 0 {
            // txn 在 drop 时回滚
            return Err(ZaplinkerError::not_found(format!("Link not found: {}", link_id)));
        }

        txn.commit().await?;
        info!(
            "Link deleted: {} ({} clicks, {} leads removed)",
            link_id, clicks.rows_affected, leads.rows_affected
        );
        Ok(())
    }

    /// 批量启用/停用
    pub async fn set_links_active(&self, link_ids: &[String], is_active: bool) -> Result<BulkOutcome> {
        if link_ids.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let result = link::Entity::update_many()
            .col_expr(link::Column::IsActive, Expr::value(is_active))
            .col_expr(link::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(link::Column::Id.is_in(link_ids.iter().cloned()))
            .exec(&self.db)
            .await?;

        info!(
            "Bulk {} {} links",
            if is_active { "activated" } else { "deactivated" },
            result.rows_affected
        );
        Ok(BulkOutcome {
            affected: result.rows_affected,
        })
    }

    /// 批量删除（单事务，连同点击和线索）
    pub async fn delete_links(&self, link_ids: &[String]) -> Result<BulkOutcome> {
        if link_ids.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let txn = self.db.begin().await?;
        click::Entity::delete_many()
            .filter(click::Column::LinkId.is_in(link_ids.iter().cloned()))
            .exec(&txn)
            .await?;
        lead::Entity::delete_many()
            .filter(lead::Column::LinkId.is_in(link_ids.iter().cloned()))
            .exec(&txn)
            .await?;
        let result = link::Entity::delete_many()
            .filter(link::Column::Id.is_in(link_ids.iter().cloned()))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!("Bulk deleted {} links", result.rows_affected);
        Ok(BulkOutcome {
            affected: result.rows_affected,
        })
    }

    pub async fn create_user(&self, email: &str, name: Option<&str>) -> Result<user::Model> {
        let model = user::ActiveModel {
            id: sea_orm::ActiveValue::Set(uuid::Uuid::new_v4().to_string()),
            email: sea_orm::ActiveValue::Set(email.to_string()),
            name: sea_orm::ActiveValue::Set(name.map(str::to_string)),
            created_at: sea_orm::ActiveValue::Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ZaplinkerError::validation(format!(
                "User with email '{}' already exists",
                email
            )),
            _ => ZaplinkerError::from(e),
        })?;

        info!("User created: {} ({})", model.email, model.id);
        Ok(model)
    }

    /// 写入或覆盖用户的套餐限制
    pub async fn upsert_usage_limit(&self, user_id: &str, plan: Plan, max_links: i32) -> Result<()> {
        let active = usage_limit::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id.to_string()),
            plan: sea_orm::ActiveValue::Set(plan.as_ref().to_string()),
            max_links: sea_orm::ActiveValue::Set(max_links),
            updated_at: sea_orm::ActiveValue::Set(Utc::now()),
        };

        usage_limit::Entity::insert(active)
            .on_conflict(
                OnConflict::column(usage_limit::Column::UserId)
                    .update_columns([
                        usage_limit::Column::Plan,
                        usage_limit::Column::MaxLinks,
                        usage_limit::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }
}
