//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::{LinkFilter, LinkStatus};

use migration::entities::{link, usage_limit, user};

impl SeaOrmStorage {
    /// 跳转/线索入口：按 slug 查找
    pub async fn find_link_by_slug(&self, slug: &str) -> Result<Option<link::Model>> {
        Ok(link::Entity::find()
            .filter(link::Column::Slug.eq(slug))
            .one(&self.db)
            .await?)
    }

    pub async fn find_link_by_id(&self, id: &str) -> Result<Option<link::Model>> {
        Ok(link::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_links_by_ids(&self, ids: &[String]) -> Result<Vec<link::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(link::Entity::find()
            .filter(link::Column::Id.is_in(ids.iter().cloned()))
            .all(&self.db)
            .await?)
    }

    /// 用户的链接，按创建时间倒序分页（page 从 1 开始）
    pub async fn list_links_for_user(
        &self,
        user_id: &str,
        page: u64,
        page_size: u64,
        filter: &LinkFilter,
    ) -> Result<(Vec<link::Model>, u64)> {
        let mut condition = Condition::all().add(link::Column::UserId.eq(user_id));

        // search: 模糊匹配 slug 或目标号码
        if let Some(ref search) = filter.search {
            condition = condition.add(
                Condition::any()
                    .add(link::Column::Slug.contains(search))
                    .add(link::Column::DestinationNumber.contains(search)),
            );
        }

        match filter.status {
            Some(LinkStatus::Active) => condition = condition.add(link::Column::IsActive.eq(true)),
            Some(LinkStatus::Inactive) => {
                condition = condition.add(link::Column::IsActive.eq(false))
            }
            None => {}
        }

        let paginator = link::Entity::find()
            .filter(condition)
            .order_by_desc(link::Column::CreatedAt)
            .order_by_asc(link::Column::Id)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((models, total))
    }

    pub async fn count_links_for_user(&self, user_id: &str) -> Result<u64> {
        Ok(link::Entity::find()
            .filter(link::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    pub async fn find_user(&self, user_id: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find_by_id(user_id).one(&self.db).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    pub async fn find_usage_limit(&self, user_id: &str) -> Result<Option<usage_limit::Model>> {
        Ok(usage_limit::Entity::find_by_id(user_id).one(&self.db).await?)
    }
}
