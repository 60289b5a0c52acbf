//! Core business logic.
//!
//! Every rule about balances, bookings, orders and the community feed lives here. The
//! functions take a SeaORM connection and plain values, so they are used the same way
//! by the bot and by the tests.

/// Append-only user activity log
pub mod activity;
/// Dashboard statistics and manual adjustments
pub mod admin;
/// Booking prices, availability and lifecycle
pub mod booking;
/// Posts, comments and likes
pub mod community;
/// Member profiles
pub mod profile;
/// Wallet reports and amount formatting
pub mod report;
/// Daily reward claims
pub mod rewards;
/// Product catalogue and checkout
pub mod store;
/// Wallet-to-wallet transfers
pub mod transfer;
/// Wallets and the ledger
pub mod wallet;
