use std::collections::BTreeMap;

use ulid::Ulid;

use crate::auth::Identity;
use crate::model::*;

use super::availability::{group_by_type, is_free, sort_rooms};
use super::conflict::validate_stay;
use super::pricing::nights;
use super::{Engine, EngineError};

fn booking_info(room: &RoomState, booking: &BookingRecord) -> BookingInfo {
    BookingInfo {
        id: booking.id,
        room_id: room.id,
        room_number: room.room_number.clone(),
        user: booking.user.clone(),
        check_in_date: booking.stay.check_in,
        check_out_date: booking.stay.check_out,
        number_of_nights: nights(&booking.stay),
        total_booking_price: booking.total_price,
        payment_status: booking.payment_status,
        created_at: booking.created_at,
    }
}

fn room_info(room: &RoomState) -> RoomInfo {
    RoomInfo {
        id: room.id,
        room_number: room.room_number.clone(),
        room_type: room.room_type,
        price_per_night: room.price_per_night,
    }
}

impl Engine {
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut rooms = Vec::with_capacity(self.state.len());
        let shared: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        for room in shared {
            let guard = room.read().await;
            rooms.push(room_info(&guard));
        }
        sort_rooms(&mut rooms);
        rooms
    }

    pub async fn get_room_info(&self, id: Ulid) -> Result<RoomInfo, EngineError> {
        let room = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = room.read().await;
        Ok(room_info(&guard))
    }

    /// Rooms free for the whole stay, optionally restricted to one type,
    /// ordered by (room type, room number).
    pub async fn available_rooms(
        &self,
        stay: &Stay,
        room_type: Option<RoomType>,
    ) -> Result<Vec<RoomInfo>, EngineError> {
        validate_stay(stay)?;
        let mut available = Vec::new();
        let shared: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        for room in shared {
            let guard = room.read().await;
            if let Some(wanted) = room_type
                && guard.room_type != wanted
            {
                continue;
            }
            if is_free(&guard, stay) {
                available.push(room_info(&guard));
            }
        }
        sort_rooms(&mut available);
        Ok(available)
    }

    /// Same result set as `available_rooms`, grouped by room type.
    pub async fn available_rooms_by_type(
        &self,
        stay: &Stay,
        room_type: Option<RoomType>,
    ) -> Result<BTreeMap<RoomType, Vec<RoomInfo>>, EngineError> {
        Ok(group_by_type(self.available_rooms(stay, room_type).await?))
    }

    /// Bookings visible to the identity — admins see everything, everyone
    /// else sees their own. Latest created first.
    pub async fn list_bookings(&self, identity: &Identity) -> Vec<BookingInfo> {
        let mut bookings = Vec::new();
        let shared: Vec<_> = self.state.iter().map(|e| e.value().clone()).collect();
        for room in shared {
            let guard = room.read().await;
            for booking in &guard.bookings {
                if identity.admin || booking.user == identity.user {
                    bookings.push(booking_info(&guard, booking));
                }
            }
        }
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings
    }

    pub async fn get_booking(
        &self,
        id: Ulid,
        identity: &Identity,
    ) -> Result<BookingInfo, EngineError> {
        let room_id = self
            .get_room_for_booking(&id)
            .ok_or(EngineError::NotFound(id))?;
        let room = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = room.read().await;
        let booking = guard.booking(id).ok_or(EngineError::NotFound(id))?;
        if !identity.admin && booking.user != identity.user {
            return Err(EngineError::NotFound(id));
        }
        Ok(booking_info(&guard, booking))
    }

    pub async fn get_payment(
        &self,
        booking_id: Ulid,
        identity: &Identity,
    ) -> Result<PaymentInfo, EngineError> {
        let room_id = self
            .get_room_for_booking(&booking_id)
            .ok_or(EngineError::NotFound(booking_id))?;
        let room = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = room.read().await;
        let booking = guard
            .booking(booking_id)
            .ok_or(EngineError::NotFound(booking_id))?;
        if !identity.admin && booking.user != identity.user {
            return Err(EngineError::NotFound(booking_id));
        }
        let payment = booking
            .payment
            .as_ref()
            .ok_or(EngineError::NotFound(booking_id))?;
        Ok(PaymentInfo {
            booking_id,
            masked_card: payment.masked_card.clone(),
            card_expiry: payment.card_expiry.clone(),
            amount: payment.amount,
            created_at: payment.created_at,
        })
    }
}
