//! 用户、链接与套餐限额表
//!
//! - users: 由外部认证服务同步的账户
//! - links: WhatsApp 短链接（含默认 UTM 与冗余计数器）
//! - usage_limits: 套餐限额，缺省时使用配置中的免费额度

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string_len(100).null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Links::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Links::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Links::Slug)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Links::UserId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Links::DestinationNumber)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Links::MessageTemplate).text().not_null())
                    .col(
                        ColumnDef::new(Links::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Links::GhostMode)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Links::UtmSource).string_len(255).null())
                    .col(ColumnDef::new(Links::UtmMedium).string_len(255).null())
                    .col(ColumnDef::new(Links::UtmCampaign).string_len(255).null())
                    .col(ColumnDef::new(Links::UtmContent).string_len(255).null())
                    .col(
                        ColumnDef::new(Links::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Links::LeadCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Links::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Links::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_links_user")
                            .from(Links::Table, Links::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 用户维度的列表查询（按创建时间倒序）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_user_created")
                    .table(Links::Table)
                    .col(Links::UserId)
                    .col(Links::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UsageLimits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsageLimits::UserId)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UsageLimits::Plan)
                            .string_len(16)
                            .not_null()
                            .default("FREE"),
                    )
                    .col(ColumnDef::new(UsageLimits::MaxLinks).integer().not_null())
                    .col(
                        ColumnDef::new(UsageLimits::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_usage_limits_user")
                            .from(UsageLimits::Table, UsageLimits::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsageLimits::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_links_user_created").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Links::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Links {
    #[sea_orm(iden = "links")]
    Table,
    Id,
    Slug,
    UserId,
    DestinationNumber,
    MessageTemplate,
    IsActive,
    GhostMode,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmContent,
    ClickCount,
    LeadCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UsageLimits {
    #[sea_orm(iden = "usage_limits")]
    Table,
    UserId,
    Plan,
    MaxLinks,
    UpdatedAt,
}
