mod availability;
mod conflict;
mod error;
mod mutations;
mod pricing;
mod queries;

pub use availability::{group_by_type, is_free, sort_rooms};
pub use error::EngineError;
pub use pricing::{nights, total_price};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::{RwLock, mpsc, oneshot};
use ulid::Ulid;

use crate::model::*;
use crate::payment::PaymentGateway;
use crate::wal::Wal;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond Ok to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                // Drain all immediately available appends
                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // Flush current batch first, then handle the non-append command
                            flush_and_respond(&mut wal, &mut batch);
                            handle_non_append(&mut wal, other);
                            break;
                        }
                        Err(_) => break, // channel empty — flush batch
                    }
                }

                if !batch.is_empty() {
                    flush_and_respond(&mut wal, &mut batch);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn flush_and_respond(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());
    respond_batch(batch, &result);
}

fn flush_batch(
    wal: &mut Wal,
    batch: &mut [(Event, oneshot::Sender<io::Result<()>>)],
) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch.iter() {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn respond_batch(batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch.drain(..) {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// The booking engine: all rooms, their bookings, and the WAL feeding them.
///
/// Every mutation is validated and applied under the target room's write
/// lock, so the overlap check and the insert are one atomic step — two
/// concurrent overlapping requests cannot both pass.
pub struct Engine {
    pub state: DashMap<Ulid, SharedRoomState>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    pub(super) gateway: Arc<dyn PaymentGateway>,
    /// Room-number uniqueness index: number → room id.
    pub(super) room_numbers: DashMap<String, Ulid>,
    /// Reverse lookup: booking id → room id.
    pub(super) booking_to_room: DashMap<Ulid, Ulid>,
    /// Mutations hold this shared across append + apply; compaction holds
    /// it exclusive, so no acknowledged event can land between the state
    /// snapshot and the WAL swap.
    pub(super) compact_lock: RwLock<()>,
    /// Bookings with a gateway charge in flight. The claim is taken under
    /// the room lock, so at most one charge per booking runs at a time.
    pub(super) charges_in_flight: DashSet<Ulid>,
}

/// Apply an event directly to a RoomState (no locking — caller holds the lock).
fn apply_to_room(room: &mut RoomState, event: &Event, booking_map: &DashMap<Ulid, Ulid>) {
    match event {
        Event::BookingCreated {
            id,
            room_id,
            user,
            stay,
            total_price,
            created_at,
        } => {
            room.insert_booking(BookingRecord {
                id: *id,
                user: user.clone(),
                stay: *stay,
                total_price: *total_price,
                payment_status: PaymentStatus::Pending,
                created_at: *created_at,
                payment: None,
            });
            booking_map.insert(*id, *room_id);
        }
        Event::BookingDeleted { id, .. } => {
            room.remove_booking(*id);
            booking_map.remove(id);
        }
        Event::PaymentCompleted {
            booking_id,
            masked_card,
            card_expiry,
            amount,
            created_at,
            ..
        } => {
            if let Some(booking) = room.booking_mut(*booking_id) {
                booking.payment_status = PaymentStatus::Completed;
                booking.payment = Some(PaymentRecord {
                    masked_card: masked_card.clone(),
                    card_expiry: card_expiry.clone(),
                    amount: *amount,
                    created_at: *created_at,
                });
            }
        }
        Event::PaymentFailed { booking_id, .. } => {
            if let Some(booking) = room.booking_mut(*booking_id) {
                booking.payment_status = PaymentStatus::Failed;
            }
        }
        // RoomCreated/Deleted are handled at the DashMap level, not here
        Event::RoomCreated { .. } | Event::RoomDeleted { .. } => {}
    }
}

impl Engine {
    pub fn new(wal_path: PathBuf, gateway: Arc<dyn PaymentGateway>) -> std::io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            state: DashMap::new(),
            wal_tx,
            gateway,
            room_numbers: DashMap::new(),
            booking_to_room: DashMap::new(),
            compact_lock: RwLock::new(()),
            charges_in_flight: DashSet::new(),
        };

        // Replay events — we're the sole owner of these Arcs, so try_read/try_write
        // always succeed instantly (no contention). Never use blocking_read/blocking_write
        // here because this runs inside an async context.
        for event in &events {
            match event {
                Event::RoomCreated {
                    id,
                    room_number,
                    room_type,
                    price_per_night,
                } => {
                    let room =
                        RoomState::new(*id, room_number.clone(), *room_type, *price_per_night);
                    engine.room_numbers.insert(room_number.clone(), *id);
                    engine.state.insert(*id, Arc::new(RwLock::new(room)));
                }
                Event::RoomDeleted { id } => {
                    if let Some(entry) = engine.state.get(id) {
                        let room = entry.try_read().expect("replay: uncontended read");
                        engine.room_numbers.remove(&room.room_number);
                        for booking in &room.bookings {
                            engine.booking_to_room.remove(&booking.id);
                        }
                    }
                    engine.state.remove(id);
                }
                other => {
                    if let Some(room_id) = event_room_id(other)
                        && let Some(entry) = engine.state.get(&room_id)
                    {
                        let room_arc = entry.clone();
                        let mut guard = room_arc.try_write().expect("replay: uncontended write");
                        apply_to_room(&mut guard, other, &engine.booking_to_room);
                    }
                }
            }
        }

        Ok(engine)
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.state.get(id).map(|e| e.value().clone())
    }

    pub fn get_room_for_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_to_room.get(booking_id).map(|e| *e.value())
    }

    /// WAL-append + apply in one call. State changes only after the append
    /// succeeds, so a store failure leaves nothing half-written.
    pub(super) async fn persist_and_apply(
        &self,
        room: &mut RoomState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        apply_to_room(room, event, &self.booking_to_room);
        Ok(())
    }

    /// Lookup booking → room, get room, acquire write lock. Rechecks that
    /// the room is still in the map after the lock is held: a concurrent
    /// room delete may have won the lock first and orphaned the state.
    pub(super) async fn resolve_booking_write(
        &self,
        booking_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<RoomState>), EngineError> {
        let room_id = self
            .get_room_for_booking(booking_id)
            .ok_or(EngineError::NotFound(*booking_id))?;
        let room = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = room.write_owned().await;
        if !self.state.contains_key(&room_id) {
            return Err(EngineError::NotFound(*booking_id));
        }
        Ok((room_id, guard))
    }
}

/// Extract the room_id from an event (for non-room-Create/Delete events).
fn event_room_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::BookingCreated { room_id, .. }
        | Event::BookingDeleted { room_id, .. }
        | Event::PaymentCompleted { room_id, .. }
        | Event::PaymentFailed { room_id, .. } => Some(*room_id),
        Event::RoomCreated { .. } | Event::RoomDeleted { .. } => None,
    }
}
