//! Create reservations table
//!
//! One row per booking request. Rows are written Pending and updated exactly
//! once to Success or Failed by the booking engine.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::NetId).string().not_null())
                    .col(ColumnDef::new(Reservations::Passwd).string().not_null())
                    .col(ColumnDef::new(Reservations::Date).string().not_null())
                    .col(ColumnDef::new(Reservations::Site).string().not_null())
                    .col(
                        ColumnDef::new(Reservations::Preferences)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Reservations::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Reservations::ReserveOn).string().not_null())
                    .col(
                        ColumnDef::new(Reservations::StatusCode)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Reservations::Msg)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Reservations::CourtTime)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_due")
                    .table(Reservations::Table)
                    .col(Reservations::StatusCode)
                    .col(Reservations::ReserveOn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_net_id")
                    .table(Reservations::Table)
                    .col(Reservations::NetId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    NetId,
    Passwd,
    Date,
    Site,
    Preferences,
    Priority,
    ReserveOn,
    StatusCode,
    Msg,
    CourtTime,
    CreatedAt,
}
