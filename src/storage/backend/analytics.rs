//! Analytics 相关的数据库查询
//!
//! 提供点击/线索的统计查询方法，供 AnalyticsService 调用。
//! 所有时间过滤均为半开区间 `[start, end)`。

use sea_orm::{
    ColumnTrait, Condition, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::TimeRange;

use migration::entities::{click, lead, link};

// ============ 查询结果类型 ============

/// 按天聚合的结果行（`day` 为 `YYYY-MM-DD`）
#[derive(Debug, FromQueryResult)]
pub struct DayRow {
    pub day: String,
    pub count: i64,
}

/// 按链接 + 天聚合的结果行（sparkline）
#[derive(Debug, FromQueryResult)]
pub struct LinkDayRow {
    pub link_id: String,
    pub day: String,
    pub count: i64,
}

/// 按链接聚合的结果行
#[derive(Debug, FromQueryResult)]
pub struct LinkCountRow {
    pub link_id: String,
    pub count: i64,
}

/// 按任意列分组的结果行
#[derive(Debug, FromQueryResult)]
pub struct BreakdownRow {
    pub label: Option<String>,
    pub count: i64,
}

/// 按天分组的日期表达式（各数据库方言不同）
///
/// 日期一律按 UTC 计算，与会话时区无关。
pub fn day_bucket_expr(backend: DbBackend, column: &str) -> Expr {
    match backend {
        DbBackend::Sqlite => Expr::cust(format!("strftime('%Y-%m-%d', {})", column)),
        // sqlx 的 MySQL 连接固定 time_zone = '+00:00'
        DbBackend::MySql => Expr::cust(format!("DATE_FORMAT({}, '%Y-%m-%d')", column)),
        DbBackend::Postgres | _ => Expr::cust(format!(
            "TO_CHAR({} AT TIME ZONE 'UTC', 'YYYY-MM-DD')",
            column
        )),
    }
}

fn click_scope(user_id: &str, link_id: Option<&str>, range: TimeRange) -> Condition {
    let mut cond = Condition::all()
        .add(click::Column::UserId.eq(user_id))
        .add(click::Column::ClickedAt.gte(range.start))
        .add(click::Column::ClickedAt.lt(range.end));
    if let Some(id) = link_id {
        cond = cond.add(click::Column::LinkId.eq(id));
    }
    cond
}

fn lead_scope(user_id: &str, link_id: Option<&str>, range: TimeRange) -> Condition {
    let mut cond = Condition::all()
        .add(lead::Column::UserId.eq(user_id))
        .add(lead::Column::ConvertedAt.gte(range.start))
        .add(lead::Column::ConvertedAt.lt(range.end));
    if let Some(id) = link_id {
        cond = cond.add(lead::Column::LinkId.eq(id));
    }
    cond
}

// ============ SeaOrmStorage Analytics 方法 ============

impl SeaOrmStorage {
    pub async fn count_clicks(
        &self,
        user_id: &str,
        link_id: Option<&str>,
        range: TimeRange,
    ) -> Result<u64> {
        Ok(click::Entity::find()
            .filter(click_scope(user_id, link_id, range))
            .count(&self.db)
            .await?)
    }

    pub async fn count_leads(
        &self,
        user_id: &str,
        link_id: Option<&str>,
        range: TimeRange,
    ) -> Result<u64> {
        Ok(lead::Entity::find()
            .filter(lead_scope(user_id, link_id, range))
            .count(&self.db)
            .await?)
    }

    pub async fn count_active_links(&self, user_id: &str) -> Result<u64> {
        Ok(link::Entity::find()
            .filter(link::Column::UserId.eq(user_id))
            .filter(link::Column::IsActive.eq(true))
            .count(&self.db)
            .await?)
    }

    /// 区间内点击最多的链接 ID（只取 ID，明细另查）
    pub async fn top_link_ids_by_clicks(
        &self,
        user_id: &str,
        range: TimeRange,
        limit: u64,
    ) -> Result<Vec<LinkCountRow>> {
        Ok(click::Entity::find()
            .select_only()
            .column(click::Column::LinkId)
            .column_as(click::Column::Id.count(), "count")
            .filter(click_scope(user_id, None, range))
            .group_by(click::Column::LinkId)
            .order_by_desc(Expr::cust("count"))
            .order_by_asc(click::Column::LinkId)
            .limit(limit)
            .into_model::<LinkCountRow>()
            .all(&self.db)
            .await?)
    }

    /// 一次分组查询取出多个链接的逐日点击
    pub async fn daily_clicks_for_links(
        &self,
        link_ids: &[String],
        range: TimeRange,
    ) -> Result<Vec<LinkDayRow>> {
        if link_ids.is_empty() {
            return Ok(Vec::new());
        }
        let day = day_bucket_expr(self.db_backend(), "clicked_at");

        Ok(click::Entity::find()
            .select_only()
            .column(click::Column::LinkId)
            .column_as(day.clone(), "day")
            .column_as(click::Column::Id.count(), "count")
            .filter(click::Column::LinkId.is_in(link_ids.iter().cloned()))
            .filter(click::Column::ClickedAt.gte(range.start))
            .filter(click::Column::ClickedAt.lt(range.end))
            .group_by(click::Column::LinkId)
            .group_by(day)
            .into_model::<LinkDayRow>()
            .all(&self.db)
            .await?)
    }

    pub async fn daily_clicks(
        &self,
        user_id: &str,
        link_id: Option<&str>,
        range: TimeRange,
    ) -> Result<Vec<DayRow>> {
        let day = day_bucket_expr(self.db_backend(), "clicked_at");

        Ok(click::Entity::find()
            .select_only()
            .column_as(day.clone(), "day")
            .column_as(click::Column::Id.count(), "count")
            .filter(click_scope(user_id, link_id, range))
            .group_by(day)
            .order_by_asc(Expr::cust("day"))
            .into_model::<DayRow>()
            .all(&self.db)
            .await?)
    }

    pub async fn daily_leads(
        &self,
        user_id: &str,
        link_id: Option<&str>,
        range: TimeRange,
    ) -> Result<Vec<DayRow>> {
        let day = day_bucket_expr(self.db_backend(), "converted_at");

        Ok(lead::Entity::find()
            .select_only()
            .column_as(day.clone(), "day")
            .column_as(lead::Column::Id.count(), "count")
            .filter(lead_scope(user_id, link_id, range))
            .group_by(day)
            .order_by_asc(Expr::cust("day"))
            .into_model::<DayRow>()
            .all(&self.db)
            .await?)
    }

    /// 按城市分组（忽略未知城市）
    pub async fn clicks_by_city(
        &self,
        user_id: &str,
        range: TimeRange,
        limit: u64,
    ) -> Result<Vec<BreakdownRow>> {
        Ok(click::Entity::find()
            .select_only()
            .column_as(click::Column::City, "label")
            .column_as(click::Column::Id.count(), "count")
            .filter(click_scope(user_id, None, range))
            .filter(click::Column::City.is_not_null())
            .group_by(click::Column::City)
            .order_by_desc(Expr::cust("count"))
            .order_by_asc(click::Column::City)
            .limit(limit)
            .into_model::<BreakdownRow>()
            .all(&self.db)
            .await?)
    }

    /// 按点击表的任意列分组（device / utm_source / utm_campaign / country）
    pub async fn click_breakdown(
        &self,
        user_id: &str,
        link_id: Option<&str>,
        range: TimeRange,
        column: click::Column,
        limit: u64,
    ) -> Result<Vec<BreakdownRow>> {
        Ok(click::Entity::find()
            .select_only()
            .column_as(column, "label")
            .column_as(click::Column::Id.count(), "count")
            .filter(click_scope(user_id, link_id, range))
            .group_by(column)
            .order_by_desc(Expr::cust("count"))
            .limit(limit)
            .into_model::<BreakdownRow>()
            .all(&self.db)
            .await?)
    }

    /// 区间内每个链接的点击数
    pub async fn clicks_per_link(&self, user_id: &str, range: TimeRange) -> Result<Vec<LinkCountRow>> {
        Ok(click::Entity::find()
            .select_only()
            .column(click::Column::LinkId)
            .column_as(click::Column::Id.count(), "count")
            .filter(click_scope(user_id, None, range))
            .group_by(click::Column::LinkId)
            .into_model::<LinkCountRow>()
            .all(&self.db)
            .await?)
    }

    /// 区间内每个链接的线索数
    pub async fn leads_per_link(&self, user_id: &str, range: TimeRange) -> Result<Vec<LinkCountRow>> {
        Ok(lead::Entity::find()
            .select_only()
            .column(lead::Column::LinkId)
            .column_as(lead::Column::Id.count(), "count")
            .filter(lead_scope(user_id, None, range))
            .group_by(lead::Column::LinkId)
            .into_model::<LinkCountRow>()
            .all(&self.db)
            .await?)
    }

    /// 用户全部链接（分析列表用，不分页）
    pub async fn all_links_for_user(&self, user_id: &str) -> Result<Vec<link::Model>> {
        Ok(link::Entity::find()
            .filter(link::Column::UserId.eq(user_id))
            .order_by_desc(link::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    // ============ 最近动态 ============

    pub async fn recent_clicks(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<(click::Model, Option<link::Model>)>> {
        Ok(click::Entity::find()
            .filter(click::Column::UserId.eq(user_id))
            .order_by_desc(click::Column::ClickedAt)
            .limit(limit)
            .find_also_related(link::Entity)
            .all(&self.db)
            .await?)
    }

    pub async fn recent_leads(
        &self,
        user_id: &str,
        limit: u64,
    ) -> Result<Vec<(lead::Model, Option<link::Model>)>> {
        Ok(lead::Entity::find()
            .filter(lead::Column::UserId.eq(user_id))
            .order_by_desc(lead::Column::ConvertedAt)
            .limit(limit)
            .find_also_related(link::Entity)
            .all(&self.db)
            .await?)
    }

    pub async fn recent_links(&self, user_id: &str, limit: u64) -> Result<Vec<link::Model>> {
        Ok(link::Entity::find()
            .filter(link::Column::UserId.eq(user_id))
            .order_by_desc(link::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?)
    }
}
