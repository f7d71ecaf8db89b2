use chrono::Datelike;

use crate::model::{RoomState, Stay};

use super::EngineError;

/// Reject malformed or degenerate stays before they reach the store.
///
/// check-in must be strictly before check-out. An earlier revision accepted
/// equal dates and relied on the one-night pricing floor; that was a
/// regression magnet and is rejected here.
pub(crate) fn validate_stay(stay: &Stay) -> Result<(), EngineError> {
    use crate::limits::*;
    if stay.check_in.year() < MIN_VALID_YEAR || stay.check_out.year() > MAX_VALID_YEAR {
        return Err(EngineError::InvalidInput("date out of supported range"));
    }
    if stay.check_in >= stay.check_out {
        return Err(EngineError::InvalidInput(
            "check-in date must be before check-out date",
        ));
    }
    if stay.raw_nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(())
}

/// The no-overlap invariant: reject the candidate stay if any existing
/// booking on the room satisfies
/// `existing.check_in < candidate.check_out && existing.check_out > candidate.check_in`.
///
/// Half-open intervals — a checkout on another booking's check-in day is fine.
/// Read-only; the caller holds the room's write lock across this check and
/// the subsequent insert, which is what makes the pair atomic.
pub(crate) fn check_no_conflict(room: &RoomState, stay: &Stay) -> Result<(), EngineError> {
    if let Some(existing) = room.overlapping(stay).next() {
        return Err(EngineError::BookingConflict(existing.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookingRecord, PaymentStatus, RoomType};
    use chrono::{NaiveDate, Utc};
    use ulid::Ulid;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn room_with(stays: &[(&str, &str)]) -> RoomState {
        let mut room = RoomState::new(
            Ulid::new(),
            "101".into(),
            RoomType::Single,
            "80.00".parse().unwrap(),
        );
        for (check_in, check_out) in stays {
            room.insert_booking(BookingRecord {
                id: Ulid::new(),
                user: "guest".into(),
                stay: Stay::new(d(check_in), d(check_out)),
                total_price: "80.00".parse().unwrap(),
                payment_status: PaymentStatus::Pending,
                created_at: Utc::now(),
                payment: None,
            });
        }
        room
    }

    #[test]
    fn empty_room_never_conflicts() {
        let room = room_with(&[]);
        let stay = Stay::new(d("2024-01-01"), d("2024-01-05"));
        assert!(check_no_conflict(&room, &stay).is_ok());
    }

    #[test]
    fn full_overlap_conflicts() {
        let room = room_with(&[("2024-01-01", "2024-01-05")]);
        let stay = Stay::new(d("2024-01-01"), d("2024-01-05"));
        assert!(matches!(
            check_no_conflict(&room, &stay),
            Err(EngineError::BookingConflict(_))
        ));
    }

    #[test]
    fn partial_overlap_conflicts() {
        let room = room_with(&[("2024-01-03", "2024-01-07")]);
        let front = Stay::new(d("2024-01-01"), d("2024-01-04"));
        let back = Stay::new(d("2024-01-06"), d("2024-01-10"));
        assert!(check_no_conflict(&room, &front).is_err());
        assert!(check_no_conflict(&room, &back).is_err());
    }

    #[test]
    fn containing_stay_conflicts() {
        let room = room_with(&[("2024-01-03", "2024-01-05")]);
        let stay = Stay::new(d("2024-01-01"), d("2024-01-10"));
        assert!(check_no_conflict(&room, &stay).is_err());
    }

    #[test]
    fn back_to_back_accepted() {
        // Checkout on the existing booking's check-in day, and vice versa.
        let room = room_with(&[("2024-01-05", "2024-01-08")]);
        let before = Stay::new(d("2024-01-01"), d("2024-01-05"));
        let after = Stay::new(d("2024-01-08"), d("2024-01-12"));
        assert!(check_no_conflict(&room, &before).is_ok());
        assert!(check_no_conflict(&room, &after).is_ok());
    }

    #[test]
    fn conflict_reports_existing_booking() {
        let room = room_with(&[("2024-01-01", "2024-01-05")]);
        let existing_id = room.bookings[0].id;
        let stay = Stay::new(d("2024-01-02"), d("2024-01-03"));
        match check_no_conflict(&room, &stay) {
            Err(EngineError::BookingConflict(id)) => assert_eq!(id, existing_id),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn validate_stay_rejects_inverted() {
        let stay = Stay::new(d("2024-01-05"), d("2024-01-01"));
        assert!(matches!(
            validate_stay(&stay),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_stay_rejects_equal_dates() {
        let stay = Stay::new(d("2024-01-05"), d("2024-01-05"));
        assert!(matches!(
            validate_stay(&stay),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_stay_rejects_ancient_dates() {
        let stay = Stay::new(d("1999-01-01"), d("1999-01-05"));
        assert!(validate_stay(&stay).is_err());
    }

    #[test]
    fn validate_stay_rejects_marathon_stay() {
        let stay = Stay::new(d("2024-01-01"), d("2026-01-01"));
        assert!(matches!(
            validate_stay(&stay),
            Err(EngineError::LimitExceeded(_))
        ));
    }

    #[test]
    fn validate_stay_accepts_one_night() {
        let stay = Stay::new(d("2024-01-01"), d("2024-01-02"));
        assert!(validate_stay(&stay).is_ok());
    }
}
