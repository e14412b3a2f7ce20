use chrono::Local;
use std::sync::Arc;

use crate::backend::{AppointmentBackend, SlotBackend};
use crate::errors::StoreError;
use crate::notifications::{Messenger, NotificationScheduler};
use crate::parser::{self, Intent};
use crate::types::{format_date, format_time, Appointment, Slot};

const USER_MENU: &str = "Hello! Welcome to our bot. How can I assist you?\n\n\
    1️⃣ View Available Appointments\n\
    2️⃣ Book Appointment\n\
    To book an appointment, type 'Book [date] [time]'.\n\
    Example: Book 28-12-2024 10:00 AM";
const ADMIN_MENU: &str = "Hello, Admin! Here are your options:\n\
    1️⃣ View Booked Appointments\n\
    2️⃣ Update Slots\n\
    3️⃣ View Remaining Slots\n\
    4️⃣ View Report";
const SLOT_TAKEN: &str =
    "The selected slot is already booked or unavailable. Please choose another.";
const NO_ACTIVE_APPOINTMENT: &str = "You have no active appointments to end or cancel.";
const GENERIC_FAILURE: &str = "An error occurred. Please try again later.";
const UNRECOGNIZED: &str = "Sorry, I didn't understand that. Send 'hi' to see what I can do.";
const ADMIN_UNRECOGNIZED: &str =
    "Sorry, I didn't understand that. Send 'hi' to see the admin options.";

/// Single entry point the transport binds to. The engine implements it; the
/// HTTP layer and its tests only depend on this seam.
pub trait IncomingHandler: Clone + Send + Sync + 'static {
    fn handle_incoming(&self, sender: &str, body: &str) -> String;
}

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub admin_numbers: Vec<String>,
    pub feedback_link: String,
    /// When false (the default), a requester with an active appointment must
    /// end or cancel it before any other command is accepted. When true, a
    /// new booking replaces the old one.
    pub allow_multiple_bookings: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Admin,
    User,
}

enum Closure {
    End,
    Cancel,
}

/// Stateless conversation state machine: per-requester state is entirely
/// encoded in the stores (no appointment = idle, appointment = booked).
pub struct ConversationEngine<S, A, M, N> {
    slots: S,
    appointments: A,
    messenger: M,
    scheduler: Arc<N>,
    settings: EngineSettings,
}

// Manual impl: the shared `Arc` means clones never need `N: Clone`.
impl<S: Clone, A: Clone, M: Clone, N> Clone for ConversationEngine<S, A, M, N> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            appointments: self.appointments.clone(),
            messenger: self.messenger.clone(),
            scheduler: Arc::clone(&self.scheduler),
            settings: self.settings.clone(),
        }
    }
}

impl<S, A, M, N> ConversationEngine<S, A, M, N>
where
    S: SlotBackend,
    A: AppointmentBackend,
    M: Messenger,
    N: NotificationScheduler,
{
    pub fn new(slots: S, appointments: A, messenger: M, scheduler: N, settings: EngineSettings) -> Self {
        Self {
            slots,
            appointments,
            messenger,
            scheduler: Arc::new(scheduler),
            settings,
        }
    }

    fn role_of(&self, sender: &str) -> Role {
        if self.settings.admin_numbers.iter().any(|admin| admin == sender) {
            Role::Admin
        } else {
            Role::User
        }
    }

    fn handle_user(&self, sender: &str, intent: Intent) -> Result<String, StoreError> {
        let active = self.appointments.find_by_requester(sender)?;

        if let Some(existing) = &active {
            let resolving = matches!(intent, Intent::End | Intent::Cancel);
            if !resolving && !self.settings.allow_multiple_bookings {
                return Ok(format!(
                    "You already have an appointment on {}. Send 'cancel' to release it first.",
                    existing.label()
                ));
            }
        }

        match intent {
            Intent::Greet => Ok(USER_MENU.to_string()),
            Intent::ShowFirst => self.available_slots("Available slots:", "No slots available."),
            Intent::Book { date, time } => self.book(sender, date, time, active),
            Intent::End => self.close_appointment(sender, Closure::End),
            Intent::Cancel => self.close_appointment(sender, Closure::Cancel),
            Intent::Invalid(message) => Ok(message),
            // Admin-only commands look like noise to regular users.
            Intent::AdminRemaining
            | Intent::AdminReport
            | Intent::UpdateSlots { .. }
            | Intent::Unrecognized => Ok(UNRECOGNIZED.to_string()),
        }
    }

    fn handle_admin(&self, intent: Intent) -> Result<String, StoreError> {
        match intent {
            Intent::Greet => Ok(ADMIN_MENU.to_string()),
            Intent::ShowFirst => self.booked_appointments("Booked Appointments:"),
            Intent::UpdateSlots { date, times } => self.update_slots(date, times),
            Intent::AdminRemaining => {
                self.available_slots("Remaining Slots:", "No remaining slots available.")
            }
            Intent::AdminReport => self.booked_appointments("Report:"),
            Intent::Invalid(message) => Ok(message),
            Intent::Book { .. } | Intent::End | Intent::Cancel | Intent::Unrecognized => {
                Ok(ADMIN_UNRECOGNIZED.to_string())
            }
        }
    }

    fn book(
        &self,
        sender: &str,
        date: chrono::NaiveDate,
        time: chrono::NaiveTime,
        active: Option<Appointment>,
    ) -> Result<String, StoreError> {
        match self.slots.claim(date, time) {
            Ok(()) => {}
            Err(StoreError::SlotUnavailable) => return Ok(SLOT_TAKEN.to_string()),
            Err(err) => return Err(err),
        }

        // Rebooking: release the previous slot only once the new claim holds.
        if let Some(previous) = active {
            let cleanup = self
                .slots
                .release(previous.date, previous.time)
                .and_then(|()| self.appointments.delete_by_requester(sender).map(|_| ()));
            if let Err(err) = cleanup {
                // The new claim must not be stranded either.
                let _ = self.slots.release(date, time);
                return Err(err);
            }
        }

        let appointment = match self.appointments.create(sender, date, time) {
            Ok(appointment) => appointment,
            Err(err) => {
                // Roll the claim back; a lost race must not strand the slot.
                let _ = self.slots.release(date, time);
                return match err {
                    StoreError::DuplicateBooking(existing) => Ok(format!(
                        "You already have an appointment on {}. Send 'cancel' to release it first.",
                        existing.label()
                    )),
                    other => Err(other),
                };
            }
        };

        self.scheduler.schedule_reminder(&appointment);
        self.scheduler.schedule_feedback_prompt(&appointment);
        self.notify_admins(&format!(
            "New appointment booked: {} by {}",
            appointment.label(),
            sender
        ));

        Ok(format!(
            "Your appointment is confirmed for {}. Thank you!",
            appointment.label()
        ))
    }

    fn close_appointment(&self, sender: &str, closure: Closure) -> Result<String, StoreError> {
        let appointment = match self.appointments.delete_by_requester(sender) {
            Ok(appointment) => appointment,
            Err(StoreError::NotFound) => return Ok(NO_ACTIVE_APPOINTMENT.to_string()),
            Err(err) => return Err(err),
        };
        self.slots.release(appointment.date, appointment.time)?;

        self.notify_admins(&format!(
            "Appointment on {} has been canceled by {}",
            appointment.label(),
            sender
        ));

        Ok(match closure {
            Closure::End => format!(
                "Your appointment on {} has been marked as completed. \
                 Please provide your feedback here: {}",
                appointment.label(),
                self.settings.feedback_link
            ),
            Closure::Cancel => {
                format!("Your appointment on {} has been canceled.", appointment.label())
            }
        })
    }

    fn available_slots(&self, header: &str, empty: &str) -> Result<String, StoreError> {
        let today = Local::now().date_naive();
        let slots = self.slots.list_available(today)?;
        if slots.is_empty() {
            return Ok(empty.to_string());
        }
        let lines: Vec<String> = slots.iter().map(Slot::label).collect();
        Ok(format!("{header}\n{}", lines.join("\n")))
    }

    fn booked_appointments(&self, header: &str) -> Result<String, StoreError> {
        let appointments = self.appointments.all()?;
        if appointments.is_empty() {
            return Ok("No appointments booked yet.".to_string());
        }
        let lines: Vec<String> = appointments
            .iter()
            .map(|appointment| format!("{} - {}", appointment.label(), appointment.requester))
            .collect();
        Ok(format!("{header}\n{}", lines.join("\n")))
    }

    fn update_slots(
        &self,
        date: chrono::NaiveDate,
        times: Vec<chrono::NaiveTime>,
    ) -> Result<String, StoreError> {
        for time in &times {
            self.slots.upsert(date, *time, true)?;
        }
        let rendered: Vec<String> = times.iter().map(|time| format_time(*time)).collect();
        Ok(format!(
            "Slots updated for {}: {}",
            format_date(date),
            rendered.join(", ")
        ))
    }

    fn notify_admins(&self, body: &str) {
        for admin in &self.settings.admin_numbers {
            self.messenger.deliver(admin, body);
        }
    }
}

impl<S, A, M, N> IncomingHandler for ConversationEngine<S, A, M, N>
where
    S: SlotBackend,
    A: AppointmentBackend,
    M: Messenger,
    N: NotificationScheduler,
{
    fn handle_incoming(&self, sender: &str, body: &str) -> String {
        let role = self.role_of(sender);
        let intent = parser::parse(body);
        tracing::debug!(%sender, ?role, ?intent, "handling incoming message");

        let result = match role {
            Role::Admin => self.handle_admin(intent),
            Role::User => self.handle_user(sender, intent),
        };
        result.unwrap_or_else(|err| {
            tracing::error!(%sender, %err, "store failure while handling message");
            GENERIC_FAILURE.to_string()
        })
    }
}
