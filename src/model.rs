use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Half-open stay `[check_in, check_out)`.
///
/// A stay ending on the day another begins does not overlap it — checkout
/// morning and check-in afternoon share the calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            check_in,
            check_out,
        }
    }

    /// Whole-day difference. May be zero for a degenerate same-day range;
    /// pricing floors that to one night, validation rejects it for bookings.
    pub fn raw_nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

/// The three room categories the hotel sells.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Suite,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Single => "single",
            RoomType::Double => "double",
            RoomType::Suite => "suite",
        }
    }
}

impl std::str::FromStr for RoomType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(RoomType::Single),
            "double" => Ok(RoomType::Double),
            "suite" => Ok(RoomType::Suite),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment lifecycle: pending → completed on a successful charge,
/// pending → failed on a declined one. A failed payment may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// A captured charge. The card number is stored masked (last 4 digits);
/// the CVV is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub masked_card: String,
    pub card_expiry: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One accepted booking on a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Ulid,
    pub user: String,
    pub stay: Stay,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub payment: Option<PaymentRecord>,
}

/// A room plus all bookings ever accepted on it, sorted by check-in date.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: Ulid,
    pub room_number: String,
    pub room_type: RoomType,
    pub price_per_night: Decimal,
    pub bookings: Vec<BookingRecord>,
}

impl RoomState {
    pub fn new(id: Ulid, room_number: String, room_type: RoomType, price_per_night: Decimal) -> Self {
        Self {
            id,
            room_number,
            room_type,
            price_per_night,
            bookings: Vec::new(),
        }
    }

    /// Insert a booking maintaining sort order by check-in date.
    pub fn insert_booking(&mut self, booking: BookingRecord) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.stay.check_in, |b| b.stay.check_in)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn remove_booking(&mut self, id: Ulid) -> Option<BookingRecord> {
        if let Some(pos) = self.bookings.iter().position(|b| b.id == id) {
            Some(self.bookings.remove(pos))
        } else {
            None
        }
    }

    pub fn booking(&self, id: Ulid) -> Option<&BookingRecord> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut BookingRecord> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Bookings whose stay overlaps the query (half-open test).
    /// Binary search skips everything checking in at or after `query.check_out`.
    pub fn overlapping(&self, query: &Stay) -> impl Iterator<Item = &BookingRecord> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.stay.check_in < query.check_out);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.stay.check_out > query.check_in)
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
///
/// Money fields go through `rust_decimal::serde::str`: the default
/// `Decimal` deserializer needs a self-describing format, which bincode
/// is not, so events would encode but never replay without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        id: Ulid,
        room_number: String,
        room_type: RoomType,
        #[serde(with = "rust_decimal::serde::str")]
        price_per_night: Decimal,
    },
    RoomDeleted {
        id: Ulid,
    },
    BookingCreated {
        id: Ulid,
        room_id: Ulid,
        user: String,
        stay: Stay,
        #[serde(with = "rust_decimal::serde::str")]
        total_price: Decimal,
        created_at: DateTime<Utc>,
    },
    BookingDeleted {
        id: Ulid,
        room_id: Ulid,
    },
    PaymentCompleted {
        booking_id: Ulid,
        room_id: Ulid,
        masked_card: String,
        card_expiry: String,
        #[serde(with = "rust_decimal::serde::str")]
        amount: Decimal,
        created_at: DateTime<Utc>,
    },
    PaymentFailed {
        booking_id: Ulid,
        room_id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub id: Ulid,
    pub room_number: String,
    pub room_type: RoomType,
    pub price_per_night: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingInfo {
    pub id: Ulid,
    pub room_id: Ulid,
    pub room_number: String,
    pub user: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_nights: i64,
    pub total_booking_price: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInfo {
    pub booking_id: Ulid,
    pub masked_card: String,
    pub card_expiry: String,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}
