//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module suggests product names and booking types as the user types.

use crate::{bot::BotData, core::store, entities::BookingType, errors::Error};
use sea_orm::Iterable;

/// Discord shows at most 25 suggestions.
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for active product names.
///
/// Returns just the name (without price) so the choice matches the command
/// parameter exactly.
pub async fn autocomplete_product_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(products) = store::get_all_active_products(&ctx.data().database).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    products
        .into_iter()
        .filter(|prod| prod.name.to_lowercase().contains(&partial_lower))
        .map(|prod| prod.name)
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Provides autocomplete suggestions for booking types.
pub async fn autocomplete_booking_type(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    BookingType::iter()
        .map(|booking_type| booking_type.to_string())
        .filter(|name| name.contains(&partial_lower))
        .collect()
}
