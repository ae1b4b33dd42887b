//! Shared constants for end-to-end tests
//!
//! When the fixture catalog changes, update only this file and fixtures.rs.

// ============================================================================
// Catalog categories
// ============================================================================

pub const ROCK_CATEGORY: &str = "rock";
pub const RAP_CATEGORY: &str = "hip hop";
pub const POP_CATEGORY: &str = "pop";
/// Not listed in any group, lands in the derived OTHER group.
pub const JAZZ_CATEGORY: &str = "jazz";

// ============================================================================
// Songs, by media ref
// ============================================================================

/// Rock, difficulty 2, 1985, local, 240s
pub const ROCK_85_REF: &str = "media-rock-85";
/// Rock, difficulty 4, 2010, international, 200s
pub const ROCK_10_REF: &str = "media-rock-10";
/// Hip hop, difficulty 3, 2018, international, 180s
pub const RAP_18_REF: &str = "media-rap-18";
/// Pop, difficulty 1, 2001, local, 210s
pub const POP_01_REF: &str = "media-pop-01";
/// Jazz, difficulty 5, 1960, international, 300s
pub const JAZZ_60_REF: &str = "media-jazz-60";
/// Jazz, difficulty 3, 1995, local, 20s (shorter than any clip)
pub const JAZZ_95_SHORT_REF: &str = "media-jazz-95";

pub const CATALOG_SIZE: usize = 6;

// ============================================================================
// Variant keys
// ============================================================================

/// Matches the whole catalog.
pub const ALL_RANDOM_KEY: &str = "RANDOM-RANDOM-RANDOM-RANDOM";
/// Matches only ROCK_85_REF.
pub const SINGLE_SONG_KEY: &str = "EASY-ROCK-LOCAL-PRE2000";
/// Valid, but no rap song is rated 4 or 5.
pub const EMPTY_VARIANT_KEY: &str = "VERYHARD-RAP-RANDOM-RANDOM";
/// Matches both jazz songs through the derived OTHER group.
pub const OTHER_GROUP_KEY: &str = "RANDOM-OTHER-RANDOM-RANDOM";
/// Matches only JAZZ_95_SHORT_REF.
pub const SHORT_SONG_KEY: &str = "MEDIUM-OTHER-LOCAL-PRE2000";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Request timeout for test HTTP client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
