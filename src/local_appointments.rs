use chrono::{NaiveDate, NaiveTime};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

use crate::backend::AppointmentBackend;
use crate::errors::StoreError;
use crate::types::Appointment;

/// In-memory appointment book. Keying by requester enforces the
/// one-active-appointment-per-requester invariant structurally.
#[derive(Debug, Clone, Default)]
pub struct LocalAppointments {
    appointments: Arc<Mutex<HashMap<String, Appointment>>>,
}

impl AppointmentBackend for LocalAppointments {
    fn find_by_requester(&self, requester: &str) -> Result<Option<Appointment>, StoreError> {
        let appointments = self.appointments.lock().unwrap();
        Ok(appointments.get(requester).cloned())
    }

    fn create(
        &self,
        requester: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.lock().unwrap();
        if let Some(existing) = appointments.get(requester) {
            return Err(StoreError::DuplicateBooking(existing.clone()));
        }
        let appointment = Appointment {
            id: Uuid::new_v4(),
            requester: requester.to_string(),
            date,
            time,
        };
        appointments.insert(requester.to_string(), appointment.clone());
        Ok(appointment)
    }

    fn delete_by_requester(&self, requester: &str) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.lock().unwrap();
        appointments.remove(requester).ok_or(StoreError::NotFound)
    }

    fn all(&self) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.lock().unwrap();
        let mut all: Vec<Appointment> = appointments.values().cloned().collect();
        all.sort_by(|a, b| {
            (a.date, a.time, &a.requester).cmp(&(b.date, b.time, &b.requester))
        });
        Ok(all)
    }
}
