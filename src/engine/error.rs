use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    /// Room or booking does not exist, or does not belong to the requester.
    NotFound(Ulid),
    AlreadyExists(Ulid),
    RoomNumberTaken(String),
    /// An existing booking on the same room overlaps the requested stay.
    BookingConflict(Ulid),
    /// The booking has already been paid for.
    PaymentAlreadyCompleted(Ulid),
    /// Another charge for this booking is still waiting on the gateway.
    PaymentInProgress(Ulid),
    /// The gateway refused the charge. The failed status has been recorded.
    PaymentDeclined(String),
    InvalidInput(&'static str),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::RoomNumberTaken(number) => {
                write!(f, "room number already in use: {number}")
            }
            EngineError::BookingConflict(id) => {
                write!(f, "room is already booked for the selected dates (booking {id})")
            }
            EngineError::PaymentAlreadyCompleted(id) => {
                write!(f, "payment already completed for booking {id}")
            }
            EngineError::PaymentInProgress(id) => {
                write!(f, "payment already in progress for booking {id}")
            }
            EngineError::PaymentDeclined(reason) => write!(f, "payment declined: {reason}"),
            EngineError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
