use async_trait::async_trait;
use rust_decimal::Decimal;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::limits::{CARD_CVV_LEN, CARD_EXPIRY_LEN, CARD_NUMBER_LEN};

/// Card details as submitted by the client. Lives only for the duration of
/// the charge — the CVV is never written to the store or the WAL.
#[derive(Debug, Clone)]
pub struct CardDetails {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
}

/// Format-only card validation: 16 digits, 3-digit CVV, MM/YY expiry.
pub fn validate_card(card: &CardDetails) -> Result<(), EngineError> {
    if card.number.len() != CARD_NUMBER_LEN || !card.number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidInput("card number must be 16 digits"));
    }
    if card.cvv.len() != CARD_CVV_LEN || !card.cvv.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidInput("CVV must be 3 digits"));
    }
    let expiry = card.expiry.as_bytes();
    if expiry.len() != CARD_EXPIRY_LEN
        || expiry[2] != b'/'
        || !expiry[..2].iter().all(u8::is_ascii_digit)
        || !expiry[3..].iter().all(u8::is_ascii_digit)
    {
        return Err(EngineError::InvalidInput("card expiry must be MM/YY"));
    }
    Ok(())
}

/// Storage form of a card number: only the last 4 digits survive.
pub fn mask_card(number: &str) -> String {
    let last4 = &number[number.len().saturating_sub(4)..];
    format!("**** **** **** {last4}")
}

#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub reference: Ulid,
}

/// The gateway said no. Distinct from a validation error — the attempt was
/// well-formed, and the failed status is recorded against the booking.
#[derive(Debug, Clone)]
pub struct Declined {
    pub reason: String,
}

impl std::fmt::Display for Declined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "declined: {}", self.reason)
    }
}

/// Pluggable charge capability. The engine only sees this trait, so a real
/// processor can replace the simulation without touching booking state logic.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, card: &CardDetails, amount: Decimal) -> Result<ChargeReceipt, Declined>;
}

/// Default gateway: approves every well-formed charge. Stands in for the
/// original system's unconditional payment simulation.
pub struct SimulatedGateway;

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(
        &self,
        _card: &CardDetails,
        _amount: Decimal,
    ) -> Result<ChargeReceipt, Declined> {
        Ok(ChargeReceipt {
            reference: Ulid::new(),
        })
    }
}
