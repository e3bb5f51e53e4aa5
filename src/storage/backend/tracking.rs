//! 点击/线索追加写入
//!
//! 明细行插入与链接计数器自增在同一个事务内完成：
//! 任一步失败整个事务回滚，`click_count`/`lead_count` 始终等于明细行数。

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, ExprTrait, TransactionTrait,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::{click_to_active_model, lead_to_active_model};
use crate::errors::{Result, ZaplinkerError};
use crate::storage::models::{NewClick, NewLead};

use migration::entities::{click, lead, link};

/// `UPDATE links SET <counter> = <counter> + 1 WHERE id = ?`
async fn increment_counter(
    txn: &DatabaseTransaction,
    link_id: &str,
    counter: link::Column,
) -> Result<()> {
    let stmt = Query::update()
        .table(link::Entity)
        .value(counter, Expr::col(counter).add(Expr::val(1i64)))
        .and_where(Expr::col(link::Column::Id).eq(Expr::val(link_id)))
        .to_owned();

    let result = txn.execute(&stmt).await?;
    if result.rows_affected() == 0 {
        return Err(ZaplinkerError::not_found(format!("Link not found: {}", link_id)));
    }
    Ok(())
}

impl SeaOrmStorage {
    /// 记录一次点击并递增 `click_count`
    pub async fn record_click(&self, new_click: &NewClick) -> Result<click::Model> {
        let txn = self.db.begin().await?;

        let model = click_to_active_model(new_click).insert(&txn).await?;
        increment_counter(&txn, &new_click.link_id, link::Column::ClickCount).await?;

        txn.commit().await?;
        debug!("Click recorded: link={} click={}", model.link_id, model.id);
        Ok(model)
    }

    /// 记录一条线索并递增 `lead_count`
    pub async fn record_lead(&self, new_lead: &NewLead) -> Result<lead::Model> {
        let txn = self.db.begin().await?;

        let model = lead_to_active_model(new_lead).insert(&txn).await?;
        increment_counter(&txn, &new_lead.link_id, link::Column::LeadCount).await?;

        txn.commit().await?;
        debug!("Lead recorded: link={} lead={}", model.link_id, model.id);
        Ok(model)
    }
}
