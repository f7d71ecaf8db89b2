use rust_decimal::Decimal;

use crate::model::Stay;

/// Number of billable nights: the whole-day difference, floored at one.
/// A same-day range still charges for a single night.
pub fn nights(stay: &Stay) -> i64 {
    stay.raw_nights().max(1)
}

/// total = nights × price_per_night, kept to 2 fractional digits.
///
/// Derived at booking creation from the room's rate — never accepted from
/// the client, never cached across rate-relevant changes.
pub fn total_price(price_per_night: Decimal, stay: &Stay) -> Decimal {
    (Decimal::from(nights(stay)) * price_per_night).round_dp(2)
}
