use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use rust_decimal::Decimal;
use tokio::sync::{RwLock, oneshot};
use ulid::Ulid;

use crate::auth::Identity;
use crate::limits::*;
use crate::model::*;
use crate::payment::{CardDetails, mask_card, validate_card};

use super::conflict::{check_no_conflict, validate_stay};
use super::pricing::total_price;
use super::{Engine, EngineError, WalCommand};

impl Engine {
    /// Create a room. When no number is supplied, the generated id's string
    /// form becomes the room number — assigned inside this single event, so
    /// no reader ever observes a room without a number.
    pub async fn create_room(
        &self,
        id: Ulid,
        room_number: Option<String>,
        room_type: RoomType,
        price_per_night: Decimal,
    ) -> Result<RoomInfo, EngineError> {
        let _gate = self.compact_lock.read().await;
        if self.state.len() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if price_per_night <= Decimal::ZERO || price_per_night > Decimal::from(MAX_PRICE_WHOLE) {
            return Err(EngineError::InvalidInput("price per night out of range"));
        }
        if price_per_night != price_per_night.round_dp(2) {
            return Err(EngineError::InvalidInput(
                "price must have at most 2 decimal places",
            ));
        }
        if self.state.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let room_number = match room_number {
            Some(n) => {
                if n.is_empty() || n.len() > MAX_ROOM_NUMBER_LEN {
                    return Err(EngineError::InvalidInput("bad room number"));
                }
                n
            }
            None => id.to_string(),
        };

        // Reserve the number first; uniqueness is decided by this entry, not
        // by a separate check-then-insert.
        match self.room_numbers.entry(room_number.clone()) {
            Entry::Occupied(_) => return Err(EngineError::RoomNumberTaken(room_number)),
            Entry::Vacant(e) => {
                e.insert(id);
            }
        }

        let event = Event::RoomCreated {
            id,
            room_number: room_number.clone(),
            room_type,
            price_per_night,
        };
        if let Err(e) = self.wal_append(&event).await {
            self.room_numbers.remove(&room_number);
            return Err(e);
        }

        let room = RoomState::new(id, room_number.clone(), room_type, price_per_night);
        self.state.insert(id, Arc::new(RwLock::new(room)));
        metrics::gauge!(crate::observability::ROOMS_ACTIVE).set(self.state.len() as f64);

        Ok(RoomInfo {
            id,
            room_number,
            room_type,
            price_per_night,
        })
    }

    /// Delete a room and, cascading, every booking on it.
    pub async fn delete_room(&self, id: Ulid) -> Result<(), EngineError> {
        let _gate = self.compact_lock.read().await;
        let room = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = room.write().await;
        if !self.state.contains_key(&id) {
            return Err(EngineError::NotFound(id));
        }

        let event = Event::RoomDeleted { id };
        self.wal_append(&event).await?;

        self.room_numbers.remove(&guard.room_number);
        for booking in &guard.bookings {
            self.booking_to_room.remove(&booking.id);
        }
        // Remove from the map before releasing the lock, so writers queued
        // on this room see it gone when they recheck.
        self.state.remove(&id);
        drop(guard);
        metrics::gauge!(crate::observability::ROOMS_ACTIVE).set(self.state.len() as f64);
        Ok(())
    }

    /// Accept a booking if the stay is valid and the room is free for it.
    ///
    /// The write lock on the room is held from the conflict check through the
    /// WAL append and the state insert: of two concurrent overlapping
    /// requests, exactly one wins.
    pub async fn create_booking(
        &self,
        id: Ulid,
        room_id: Ulid,
        identity: &Identity,
        stay: Stay,
    ) -> Result<BookingInfo, EngineError> {
        validate_stay(&stay)?;
        if identity.user.is_empty() || identity.user.len() > MAX_USERNAME_LEN {
            return Err(EngineError::InvalidInput("bad username"));
        }
        let _gate = self.compact_lock.read().await;
        let room = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let mut guard = room.write().await;
        // A concurrent room delete may have won the lock first; the clone
        // of the Arc above would still hold the orphaned state.
        if !self.state.contains_key(&room_id) {
            return Err(EngineError::NotFound(room_id));
        }
        if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many bookings on room"));
        }

        if let Err(e) = check_no_conflict(&guard, &stay) {
            metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(e);
        }

        let price = total_price(guard.price_per_night, &stay);
        let created_at = Utc::now();
        let event = Event::BookingCreated {
            id,
            room_id,
            user: identity.user.clone(),
            stay,
            total_price: price,
            created_at,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);

        Ok(BookingInfo {
            id,
            room_id,
            room_number: guard.room_number.clone(),
            user: identity.user.clone(),
            check_in_date: stay.check_in,
            check_out_date: stay.check_out,
            number_of_nights: super::pricing::nights(&stay),
            total_booking_price: price,
            payment_status: PaymentStatus::Pending,
            created_at,
        })
    }

    /// Delete a booking. Only its owner (or an admin) may; anyone else sees
    /// not-found rather than learning the booking exists.
    pub async fn delete_booking(&self, id: Ulid, identity: &Identity) -> Result<(), EngineError> {
        let _gate = self.compact_lock.read().await;
        let (room_id, mut guard) = self.resolve_booking_write(&id).await?;
        let booking = guard.booking(id).ok_or(EngineError::NotFound(id))?;
        if !identity.admin && booking.user != identity.user {
            return Err(EngineError::NotFound(id));
        }
        let event = Event::BookingDeleted { id, room_id };
        self.persist_and_apply(&mut guard, &event).await
    }

    /// Charge for a booking. The amount is always the room's current nightly
    /// rate — client-submitted amounts are ignored. On approval the masked
    /// card is recorded and the booking flips to completed; on decline the
    /// failed status is recorded and the decline is surfaced.
    ///
    /// Validation and the in-flight claim happen under the room lock; the
    /// gateway call runs with the lock released, so a slow charge does not
    /// stall reads and bookings on the room. The claim keeps a second
    /// attempt from charging the same booking in parallel.
    pub async fn record_payment(
        &self,
        booking_id: Ulid,
        identity: &Identity,
        card: &CardDetails,
    ) -> Result<PaymentInfo, EngineError> {
        validate_card(card)?;
        let amount = {
            let (_room_id, guard) = self.resolve_booking_write(&booking_id).await?;
            let booking = guard
                .booking(booking_id)
                .ok_or(EngineError::NotFound(booking_id))?;
            if !identity.admin && booking.user != identity.user {
                return Err(EngineError::NotFound(booking_id));
            }
            if booking.payment_status == PaymentStatus::Completed {
                return Err(EngineError::PaymentAlreadyCompleted(booking_id));
            }
            if !self.charges_in_flight.insert(booking_id) {
                return Err(EngineError::PaymentInProgress(booking_id));
            }
            guard.price_per_night
        };

        let outcome = self.gateway.charge(card, amount).await;
        let result = self.settle_payment(booking_id, card, amount, outcome).await;
        self.charges_in_flight.remove(&booking_id);
        result
    }

    async fn settle_payment(
        &self,
        booking_id: Ulid,
        card: &CardDetails,
        amount: Decimal,
        outcome: Result<crate::payment::ChargeReceipt, crate::payment::Declined>,
    ) -> Result<PaymentInfo, EngineError> {
        let _gate = self.compact_lock.read().await;
        // The booking may have been deleted while the charge was in flight;
        // a real gateway integration would void the capture here.
        let (room_id, mut guard) = self.resolve_booking_write(&booking_id).await?;
        match outcome {
            Ok(receipt) => {
                let created_at = Utc::now();
                let event = Event::PaymentCompleted {
                    booking_id,
                    room_id,
                    masked_card: mask_card(&card.number),
                    card_expiry: card.expiry.clone(),
                    amount,
                    created_at,
                };
                self.persist_and_apply(&mut guard, &event).await?;
                metrics::counter!(crate::observability::PAYMENTS_COMPLETED_TOTAL).increment(1);
                tracing::info!(%booking_id, reference = %receipt.reference, "payment captured");
                Ok(PaymentInfo {
                    booking_id,
                    masked_card: mask_card(&card.number),
                    card_expiry: card.expiry.clone(),
                    amount,
                    created_at,
                })
            }
            Err(declined) => {
                let event = Event::PaymentFailed {
                    booking_id,
                    room_id,
                };
                self.persist_and_apply(&mut guard, &event).await?;
                metrics::counter!(crate::observability::PAYMENTS_FAILED_TOTAL).increment(1);
                Err(EngineError::PaymentDeclined(declined.reason))
            }
        }
    }

    /// Compact the WAL by rewriting it with only the events needed to recreate the current state.
    ///
    /// Holds the compaction gate exclusively for the whole snapshot + swap,
    /// so an event acknowledged after the snapshot cannot be appended to the
    /// old file and lost in the swap.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _gate = self.compact_lock.write().await;
        let mut events = Vec::new();

        let room_ids: Vec<Ulid> = self.state.iter().map(|e| *e.key()).collect();
        for id in room_ids {
            let entry = match self.state.get(&id) {
                Some(e) => e,
                None => continue,
            };
            let room = entry.value().clone();
            drop(entry);
            let guard = room.read().await;

            events.push(Event::RoomCreated {
                id: guard.id,
                room_number: guard.room_number.clone(),
                room_type: guard.room_type,
                price_per_night: guard.price_per_night,
            });

            for booking in &guard.bookings {
                events.push(Event::BookingCreated {
                    id: booking.id,
                    room_id: guard.id,
                    user: booking.user.clone(),
                    stay: booking.stay,
                    total_price: booking.total_price,
                    created_at: booking.created_at,
                });
                match (&booking.payment, booking.payment_status) {
                    (Some(payment), _) => events.push(Event::PaymentCompleted {
                        booking_id: booking.id,
                        room_id: guard.id,
                        masked_card: payment.masked_card.clone(),
                        card_expiry: payment.card_expiry.clone(),
                        amount: payment.amount,
                        created_at: payment.created_at,
                    }),
                    (None, PaymentStatus::Failed) => events.push(Event::PaymentFailed {
                        booking_id: booking.id,
                        room_id: guard.id,
                    }),
                    (None, _) => {}
                }
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
