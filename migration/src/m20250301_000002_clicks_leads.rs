//! 点击与线索明细表
//!
//! 两张表都通过外键级联到 links，删除链接时明细随之删除。

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_users_links::Links;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Clicks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clicks::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Clicks::LinkId).string_len(36).not_null())
                    .col(ColumnDef::new(Clicks::UserId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Clicks::ClickedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Clicks::IpAddress).string_len(64).null())
                    .col(ColumnDef::new(Clicks::UserAgent).text().null())
                    .col(ColumnDef::new(Clicks::Referrer).text().null())
                    .col(
                        ColumnDef::new(Clicks::Device)
                            .string_len(16)
                            .not_null()
                            .default("OTHER"),
                    )
                    .col(ColumnDef::new(Clicks::UtmSource).string_len(255).null())
                    .col(ColumnDef::new(Clicks::UtmMedium).string_len(255).null())
                    .col(ColumnDef::new(Clicks::UtmCampaign).string_len(255).null())
                    .col(ColumnDef::new(Clicks::UtmContent).string_len(255).null())
                    .col(ColumnDef::new(Clicks::UtmTerm).string_len(255).null())
                    .col(ColumnDef::new(Clicks::Fbp).string_len(255).null())
                    .col(ColumnDef::new(Clicks::Fbc).string_len(255).null())
                    .col(ColumnDef::new(Clicks::City).string_len(100).null())
                    .col(ColumnDef::new(Clicks::Country).string_len(64).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_clicks_link")
                            .from(Clicks::Table, Clicks::LinkId)
                            .to(Links::Table, Links::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 单链接时间序列（sparkline）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clicks_link_time")
                    .table(Clicks::Table)
                    .col(Clicks::LinkId)
                    .col(Clicks::ClickedAt)
                    .to_owned(),
            )
            .await?;

        // 用户维度的时间范围聚合（overview）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_clicks_user_time")
                    .table(Clicks::Table)
                    .col(Clicks::UserId)
                    .col(Clicks::ClickedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Leads::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Leads::LinkId).string_len(36).not_null())
                    .col(ColumnDef::new(Leads::UserId).string_len(36).not_null())
                    .col(ColumnDef::new(Leads::Phone).string_len(20).not_null())
                    .col(ColumnDef::new(Leads::Name).string_len(100).null())
                    .col(ColumnDef::new(Leads::Email).string_len(255).null())
                    .col(ColumnDef::new(Leads::UtmSource).string_len(255).null())
                    .col(ColumnDef::new(Leads::UtmMedium).string_len(255).null())
                    .col(ColumnDef::new(Leads::UtmCampaign).string_len(255).null())
                    .col(ColumnDef::new(Leads::UtmContent).string_len(255).null())
                    .col(
                        ColumnDef::new(Leads::ConvertedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_link")
                            .from(Leads::Table, Leads::LinkId)
                            .to(Links::Table, Links::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_leads_link_time")
                    .table(Leads::Table)
                    .col(Leads::LinkId)
                    .col(Leads::ConvertedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_leads_user_time")
                    .table(Leads::Table)
                    .col(Leads::UserId)
                    .col(Leads::ConvertedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_leads_user_time").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_leads_link_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Leads::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_clicks_user_time").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_clicks_link_time").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Clicks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Clicks {
    #[sea_orm(iden = "clicks")]
    Table,
    Id,
    LinkId,
    UserId,
    ClickedAt,
    IpAddress,
    UserAgent,
    Referrer,
    Device,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmContent,
    UtmTerm,
    Fbp,
    Fbc,
    City,
    Country,
}

#[derive(DeriveIden)]
enum Leads {
    #[sea_orm(iden = "leads")]
    Table,
    Id,
    LinkId,
    UserId,
    Phone,
    Name,
    Email,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmContent,
    ConvertedAt,
}
