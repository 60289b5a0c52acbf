//! Availability entity - Windows during which a resource can be booked.

use super::booking::BookingType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Availability window database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "availability")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Resource the window applies to
    pub booking_type: BookingType,
    /// Window start (inclusive)
    pub start_time: DateTimeUtc,
    /// Window end (exclusive)
    pub end_time: DateTimeUtc,
    /// Admin who opened the window
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
