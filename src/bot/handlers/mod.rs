//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions that are not commands
//! themselves.

/// Autocomplete handlers for product names and booking types
pub mod autocomplete;
