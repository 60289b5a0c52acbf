//! Admin configuration loaded from environment variables.
//!
//! `JESTFLY_ADMIN_IDS` holds a comma-separated list of user IDs allowed to use the
//! admin dashboard commands.

use std::collections::HashSet;

const ADMIN_IDS_VAR: &str = "JESTFLY_ADMIN_IDS";

/// Parses a comma-separated list of user IDs, ignoring blanks and surrounding spaces.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Reads the admin set from the environment. Returns an empty set when unset.
#[must_use]
pub fn load_admin_ids() -> HashSet<String> {
    std::env::var(ADMIN_IDS_VAR)
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}
