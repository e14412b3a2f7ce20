use chrono::{NaiveDate, NaiveTime};

use crate::errors::StoreError;
use crate::types::{Appointment, Slot};

pub trait SlotBackend: Clone + Send + Sync + 'static {
    /// All available slots with `date >= from_date`, ordered by (date, time).
    fn list_available(&self, from_date: NaiveDate) -> Result<Vec<Slot>, StoreError>;
    fn find(&self, date: NaiveDate, time: NaiveTime) -> Result<Option<Slot>, StoreError>;
    /// Atomically marks the slot unavailable. Exactly one of several
    /// concurrent callers succeeds; the rest get `SlotUnavailable`.
    fn claim(&self, date: NaiveDate, time: NaiveTime) -> Result<(), StoreError>;
    /// Marks the slot available again. No-op if the slot does not exist.
    fn release(&self, date: NaiveDate, time: NaiveTime) -> Result<(), StoreError>;
    fn upsert(&self, date: NaiveDate, time: NaiveTime, available: bool) -> Result<(), StoreError>;
}

pub trait AppointmentBackend: Clone + Send + Sync + 'static {
    fn find_by_requester(&self, requester: &str) -> Result<Option<Appointment>, StoreError>;
    /// Fails with `DuplicateBooking` if the requester already holds an
    /// active appointment.
    fn create(
        &self,
        requester: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Appointment, StoreError>;
    /// Removes and returns the requester's appointment, `NotFound` if none.
    fn delete_by_requester(&self, requester: &str) -> Result<Appointment, StoreError>;
    fn all(&self) -> Result<Vec<Appointment>, StoreError>;
}
