use chrono::{NaiveDate, NaiveTime};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::backend::SlotBackend;
use crate::errors::StoreError;
use crate::types::Slot;

/// In-memory slot inventory. The ordered map keyed by (date, time) keeps
/// listings sorted without an extra pass, and the mutex serializes claims so
/// concurrent bookings of the same slot have a single winner.
#[derive(Debug, Clone, Default)]
pub struct LocalSlots {
    slots: Arc<Mutex<BTreeMap<(NaiveDate, NaiveTime), Slot>>>,
}

impl SlotBackend for LocalSlots {
    fn list_available(&self, from_date: NaiveDate) -> Result<Vec<Slot>, StoreError> {
        let slots = self.slots.lock().unwrap();
        Ok(slots
            .range((from_date, NaiveTime::MIN)..)
            .filter(|(_, slot)| slot.available)
            .map(|(_, slot)| slot.clone())
            .collect())
    }

    fn find(&self, date: NaiveDate, time: NaiveTime) -> Result<Option<Slot>, StoreError> {
        let slots = self.slots.lock().unwrap();
        Ok(slots.get(&(date, time)).cloned())
    }

    fn claim(&self, date: NaiveDate, time: NaiveTime) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().unwrap();
        match slots.get_mut(&(date, time)) {
            Some(slot) if slot.available => {
                slot.available = false;
                Ok(())
            }
            _ => Err(StoreError::SlotUnavailable),
        }
    }

    fn release(&self, date: NaiveDate, time: NaiveTime) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.get_mut(&(date, time)) {
            slot.available = true;
        }
        Ok(())
    }

    fn upsert(&self, date: NaiveDate, time: NaiveTime, available: bool) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().unwrap();
        slots.insert(
            (date, time),
            Slot {
                date,
                time,
                available,
            },
        );
        Ok(())
    }
}
