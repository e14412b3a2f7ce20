use thiserror::Error;

use crate::types::Appointment;

/// Failures surfaced by the slot and appointment stores. Everything except
/// `Backend` is user-correctable and mapped to guidance text by the engine;
/// `Backend` is logged and reported only as a generic apology.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("slot is unavailable or does not exist")]
    SlotUnavailable,
    #[error("requester already has an active appointment on {}", .0.label())]
    DuplicateBooking(Appointment),
    #[error("no active appointment for requester")]
    NotFound,
    #[error("store failure: {0}")]
    Backend(String),
}
