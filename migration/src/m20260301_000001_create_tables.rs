use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create guilds table (one row per tenant)
        manager
            .create_table(
                Table::create()
                    .table(Guilds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Guilds::GuildId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Guilds::Name).string())
                    .col(
                        ColumnDef::new(Guilds::Frozen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Guilds::AllowNsfw)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Guilds::JoinedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create chats table (per-destination settings)
        manager
            .create_table(
                Table::create()
                    .table(Chats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chats::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Chats::GuildId).big_integer())
                    .col(ColumnDef::new(Chats::Title).string())
                    .col(
                        ColumnDef::new(Chats::Nsfw)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Chats::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create subscriptions table
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::ServiceType).string().not_null())
                    .col(ColumnDef::new(Subscriptions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Subscriptions::GuildId).big_integer())
                    .col(ColumnDef::new(Subscriptions::ChannelId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::SearchCriteria)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Subscriptions::Filters).string())
                    .col(
                        ColumnDef::new(Subscriptions::IsPm)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Subscriptions::LastReportedId).string())
                    .col(
                        ColumnDef::new(Subscriptions::SubscribedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Scheduler loads every subscription of one service per cycle
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subscriptions_service_type")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::ServiceType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Guilds::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Guilds {
    Table,
    GuildId,
    Name,
    Frozen,
    AllowNsfw,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Chats {
    Table,
    Id,
    GuildId,
    Title,
    Nsfw,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    ServiceType,
    UserId,
    GuildId,
    ChannelId,
    SearchCriteria,
    Filters,
    IsPm,
    LastReportedId,
    SubscribedAt,
}
