//! Hard limits. Every unbounded input is clamped by one of these.

/// Maximum number of rooms in the inventory.
pub const MAX_ROOMS: usize = 10_000;

/// Maximum bookings held on a single room (past and future).
pub const MAX_BOOKINGS_PER_ROOM: usize = 10_000;

/// Longest accepted stay, in nights.
pub const MAX_STAY_NIGHTS: i64 = 365;

/// Dates outside this year window are rejected as garbage input.
pub const MIN_VALID_YEAR: i32 = 2000;
pub const MAX_VALID_YEAR: i32 = 2100;

/// Room numbers are short labels, not free text.
pub const MAX_ROOM_NUMBER_LEN: usize = 32;

/// Usernames come from the identity collaborator; clamp anyway.
pub const MAX_USERNAME_LEN: usize = 150;

/// Nightly rate ceiling (whole currency units).
pub const MAX_PRICE_WHOLE: i64 = 1_000_000;

/// Card format: exactly 16 digits, 3-digit CVV, "MM/YY" expiry.
pub const CARD_NUMBER_LEN: usize = 16;
pub const CARD_CVV_LEN: usize = 3;
pub const CARD_EXPIRY_LEN: usize = 5;
