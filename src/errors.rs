//! Unified error type for the JESTFLY service.
//!
//! Domain rejections carry structured fields so the bot layer can decide what to show;
//! infrastructure failures wrap their source error.

use crate::entities::{BookingStatus, BookingType};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: i64 },

    #[error("Insufficient funds: balance is {current}, {required} required")]
    InsufficientFunds { current: i64, required: i64 },

    #[error("No wallet found for user {user_id}")]
    WalletNotFound { user_id: String },

    #[error("No profile found for user {user_id}")]
    ProfileNotFound { user_id: String },

    #[error("Cannot transfer JestCoins to yourself")]
    SelfTransfer,

    #[error("Daily reward already claimed for {date}")]
    RewardAlreadyClaimed { date: NaiveDate },

    #[error("Product '{name}' not found")]
    ProductNotFound { name: String },

    #[error("Not enough stock for '{name}': {available} left")]
    OutOfStock { name: String, available: i32 },

    #[error("Booking #{id} not found")]
    BookingNotFound { id: i64 },

    #[error("The requested {booking_type} slot is not available")]
    SlotUnavailable { booking_type: BookingType },

    #[error("Cannot move booking from {from} to {to}")]
    InvalidBookingTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Post #{id} not found")]
    PostNotFound { id: i64 },

    #[error("Comment #{id} not found")]
    CommentNotFound { id: i64 },

    #[error("Not allowed: {message}")]
    Forbidden { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("Integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),

    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the message is meant for the person who issued the command.
    ///
    /// Infrastructure failures return `false`; they are logged and replaced with a
    /// generic reply.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Config { .. }
                | Self::Database(_)
                | Self::Io(_)
                | Self::EnvVar(_)
                | Self::Fmt(_)
                | Self::TryFromInt(_)
                | Self::Framework(_)
        )
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_user_facing() {
        assert!(Error::SelfTransfer.is_user_facing());
        assert!(
            Error::InsufficientFunds {
                current: 1_000,
                required: 4_000
            }
            .is_user_facing()
        );
        assert!(
            Error::InvalidBookingTransition {
                from: BookingStatus::Completed,
                to: BookingStatus::Cancelled,
            }
            .is_user_facing()
        );
    }

    #[test]
    fn test_infrastructure_errors_are_hidden() {
        assert!(!Error::Database(sea_orm::DbErr::Custom("boom".to_string())).is_user_facing());
        assert!(
            !Error::Config {
                message: "bad".to_string()
            }
            .is_user_facing()
        );
    }

    #[test]
    fn test_transition_message() {
        let err = Error::InvalidBookingTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Cannot move booking from completed to cancelled");
    }
}
