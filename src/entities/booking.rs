//! Booking entity - A scheduled use of a DJ, the studio or a consultant.
//!
//! Status moves `pending -> confirmed | cancelled` and `confirmed -> completed | cancelled`.
//! Bookings are never hard-deleted; cancelling only changes `status`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource a booking reserves
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    #[sea_orm(string_value = "dj")]
    Dj,
    #[sea_orm(string_value = "studio")]
    Studio,
    #[sea_orm(string_value = "consulting")]
    Consulting,
}

impl BookingType {
    /// Parses the lowercase name used in commands and configuration.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "dj" => Some(Self::Dj),
            "studio" => Some(Self::Studio),
            "consulting" => Some(Self::Consulting),
            _ => None,
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dj => "dj",
            Self::Studio => "studio",
            Self::Consulting => "consulting",
        })
    }
}

/// Lifecycle state of a booking
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl BookingStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }

    /// Pending and confirmed bookings hold their slot.
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        })
    }
}

/// Booking database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    /// Unique identifier for the booking
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who made the booking
    #[sea_orm(indexed)]
    pub user_id: String,
    /// Reserved resource
    pub booking_type: BookingType,
    /// Start of the reserved interval (inclusive)
    pub start_time: DateTimeUtc,
    /// End of the reserved interval (exclusive)
    pub end_time: DateTimeUtc,
    /// Price in cents, computed when the booking is created
    pub price: i64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
