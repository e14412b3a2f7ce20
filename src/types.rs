use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical textual forms used in replies and notifications.
pub const DATE_FORMAT: &str = "%d-%m-%Y";
pub const TIME_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub requester: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

impl Slot {
    pub fn label(&self) -> String {
        format!("{} at {}", format_date(self.date), format_time(self.time))
    }
}

impl Appointment {
    pub fn label(&self) -> String {
        format!("{} at {}", format_date(self.date), format_time(self.time))
    }
}
