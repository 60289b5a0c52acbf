//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Admin dashboard commands
pub mod admin;

/// Booking commands
pub mod booking;

/// Community feed commands
pub mod community;

/// General utility commands
pub mod general;

/// Profile commands
pub mod profile;

/// Store commands
pub mod store;

/// JestCoin wallet commands
pub mod wallet;

use crate::{bot::BotData, errors::Error};

// Export commands
pub use admin::*;
pub use booking::*;
pub use community::*;
pub use general::*;
pub use profile::*;
pub use store::*;
pub use wallet::*;

/// Every command registered with Discord.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        profile(),
        balance(),
        history(),
        transfer(),
        daily(),
        shop(),
        buy(),
        orders(),
        book(),
        slots(),
        bookings(),
        cancel_booking(),
        post(),
        feed(),
        comment(),
        like(),
        delete_post(),
        admin(),
    ]
}
