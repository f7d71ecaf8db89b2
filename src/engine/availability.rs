use std::collections::BTreeMap;

use crate::model::{RoomInfo, RoomState, RoomType, Stay};

// ── Availability Algorithm ────────────────────────────────────────

/// A room is free for a stay when no existing booking overlaps it
/// (half-open test, same rule the conflict validator enforces).
pub fn is_free(room: &RoomState, stay: &Stay) -> bool {
    room.overlapping(stay).next().is_none()
}

/// Canonical ordering for availability results: room type, then room number.
pub fn sort_rooms(rooms: &mut [RoomInfo]) {
    rooms.sort_by(|a, b| {
        a.room_type
            .cmp(&b.room_type)
            .then_with(|| a.room_number.cmp(&b.room_number))
    });
}

/// Alternate response shape: room type → its available rooms.
/// Input order is preserved within each bucket.
pub fn group_by_type(rooms: Vec<RoomInfo>) -> BTreeMap<RoomType, Vec<RoomInfo>> {
    let mut grouped: BTreeMap<RoomType, Vec<RoomInfo>> = BTreeMap::new();
    for room in rooms {
        grouped.entry(room.room_type).or_default().push(room);
    }
    grouped
}
