use chrono::{NaiveDate, NaiveTime};
use std::sync::{Arc, Mutex};

use crate::backend::AppointmentBackend;
use crate::engine::IncomingHandler;
use crate::errors::StoreError;
use crate::local_appointments::LocalAppointments;
use crate::notifications::Messenger;
use crate::types::Appointment;

/// Captures every outbound delivery so tests can assert on recipients and
/// message bodies.
#[derive(Clone, Default)]
pub struct RecordingMessenger(Arc<Mutex<Vec<(String, String)>>>);

impl RecordingMessenger {
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.0.lock().unwrap().clone()
    }
}

impl Messenger for RecordingMessenger {
    fn deliver(&self, recipient: &str, body: &str) {
        self.0
            .lock()
            .unwrap()
            .push((recipient.to_string(), body.to_string()));
    }
}

/// Appointment store whose every operation fails, for exercising the
/// generic-apology path.
#[derive(Clone, Default)]
pub struct FailingAppointments;

impl AppointmentBackend for FailingAppointments {
    fn find_by_requester(&self, _requester: &str) -> Result<Option<Appointment>, StoreError> {
        Err(StoreError::Backend("appointment store offline".into()))
    }

    fn create(
        &self,
        _requester: &str,
        _date: NaiveDate,
        _time: NaiveTime,
    ) -> Result<Appointment, StoreError> {
        Err(StoreError::Backend("appointment store offline".into()))
    }

    fn delete_by_requester(&self, _requester: &str) -> Result<Appointment, StoreError> {
        Err(StoreError::Backend("appointment store offline".into()))
    }

    fn all(&self) -> Result<Vec<Appointment>, StoreError> {
        Err(StoreError::Backend("appointment store offline".into()))
    }
}

/// Appointment store where only deletion fails, for exercising cleanup paths
/// that run after a booking has partially progressed.
#[derive(Clone, Default)]
pub struct UndeletableAppointments(pub LocalAppointments);

impl AppointmentBackend for UndeletableAppointments {
    fn find_by_requester(&self, requester: &str) -> Result<Option<Appointment>, StoreError> {
        self.0.find_by_requester(requester)
    }

    fn create(
        &self,
        requester: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Appointment, StoreError> {
        self.0.create(requester, date, time)
    }

    fn delete_by_requester(&self, _requester: &str) -> Result<Appointment, StoreError> {
        Err(StoreError::Backend("appointment deletion failed".into()))
    }

    fn all(&self) -> Result<Vec<Appointment>, StoreError> {
        self.0.all()
    }
}

/// Canned-reply handler for transport tests; records every (sender, body)
/// pair it was called with.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    reply: String,
}

impl RecordingHandler {
    pub fn replying(reply: &str) -> Self {
        Self {
            calls: Arc::default(),
            reply: reply.to_string(),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl IncomingHandler for RecordingHandler {
    fn handle_incoming(&self, sender: &str, body: &str) -> String {
        self.calls
            .lock()
            .unwrap()
            .push((sender.to_string(), body.to_string()));
        self.reply.clone()
    }
}
