//! Reservation entity
//!
//! `preferences` and `court_time` hold JSON; `date` and `reserve_on` are
//! `YYYY-MM-DD` strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub net_id: String,
    pub passwd: String,
    pub date: String,
    pub site: String,
    pub preferences: String,
    pub priority: i32,
    pub reserve_on: String,

    /// 0 = Pending, 1 = Success, 2 = Failed
    pub status_code: i32,
    pub msg: String,
    pub court_time: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
