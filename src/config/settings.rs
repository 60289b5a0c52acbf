//! Application settings loaded from `config.toml`.
//!
//! Every section has defaults, so a missing file or a file that only overrides a few
//! values still yields a complete [`AppConfig`].

use crate::entities::BookingType;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Minor units per JestCoin.
pub const COIN: i64 = 100;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[rewards]` section
    pub rewards: RewardConfig,
    /// `[booking]` section
    pub booking: BookingConfig,
    /// `[wallet]` section
    pub wallet: WalletConfig,
    /// `[community]` section
    pub community: CommunityConfig,
}

/// Daily reward settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Whole JestCoins credited by one daily claim
    pub daily_amount: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self { daily_amount: 10 }
    }
}

impl RewardConfig {
    /// Daily reward in minor units.
    #[must_use]
    pub fn daily_amount_minor(&self) -> i64 {
        i64::from(self.daily_amount) * COIN
    }
}

/// Booking settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// `[booking.hourly_rates]` table
    pub hourly_rates: HourlyRates,
}

/// Hourly rate per bookable resource, in whole currency units
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HourlyRates {
    /// DJ set
    pub dj: u32,
    /// Studio session
    pub studio: u32,
    /// Consulting call
    pub consulting: u32,
}

impl Default for HourlyRates {
    fn default() -> Self {
        Self {
            dj: 300,
            studio: 100,
            consulting: 150,
        }
    }
}

impl HourlyRates {
    /// Hourly rate for `booking_type` in cents.
    #[must_use]
    pub fn cents_per_hour(&self, booking_type: BookingType) -> i64 {
        let whole = match booking_type {
            BookingType::Dj => self.dj,
            BookingType::Studio => self.studio,
            BookingType::Consulting => self.consulting,
        };
        i64::from(whole) * 100
    }
}

/// Wallet presentation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Ledger rows shown by default in the history view
    pub history_limit: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

/// Community feed settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Posts per feed page
    pub feed_page_size: u64,
    /// Maximum characters in a post or comment
    pub max_post_length: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            feed_page_size: 10,
            max_post_length: 2000,
        }
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads `./config.toml`, falling back to defaults when the file does not exist.
///
/// A file that exists but fails to parse is still an error.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if !path.exists() {
        warn!("config.toml not found, using default settings");
        return Ok(AppConfig::default());
    }

    let config = load_config(path)?;
    info!("Loaded settings from config.toml");
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r"
            [rewards]
            daily_amount = 25

            [booking.hourly_rates]
            dj = 400
            studio = 120
            consulting = 90

            [wallet]
            history_limit = 5

            [community]
            feed_page_size = 20
            max_post_length = 500
        ";

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.rewards.daily_amount, 25);
        assert_eq!(config.rewards.daily_amount_minor(), 2_500);
        assert_eq!(config.booking.hourly_rates.cents_per_hour(BookingType::Dj), 40_000);
        assert_eq!(config.booking.hourly_rates.cents_per_hour(BookingType::Consulting), 9_000);
        assert_eq!(config.wallet.history_limit, 5);
        assert_eq!(config.community.feed_page_size, 20);
        assert_eq!(config.community.max_post_length, 500);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("[rewards]\ndaily_amount = 3\n").unwrap();
        assert_eq!(config.rewards.daily_amount, 3);
        assert_eq!(config.booking.hourly_rates.studio, 100);
        assert_eq!(config.wallet.history_limit, 10);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = parse_config("[rewards]\ndaily_amount = \"lots\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
