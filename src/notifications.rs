use chrono::{DateTime, Duration, Local, TimeZone};

use crate::backend::AppointmentBackend;
use crate::types::{format_date, format_time, Appointment};

/// Outbound channel delivery. Fire-and-forget: the core never observes or
/// blocks on the result.
pub trait Messenger: Clone + Send + Sync + 'static {
    fn deliver(&self, recipient: &str, body: &str);
}

/// Timer-driven side effects registered at booking time.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationScheduler: Send + Sync + 'static {
    fn schedule_reminder(&self, appointment: &Appointment);
    fn schedule_feedback_prompt(&self, appointment: &Appointment);
}

#[derive(Clone)]
struct TwilioCredentials {
    account_sid: String,
    auth_token: String,
    from_number: String,
}

/// Messenger backed by the Twilio Messages API. Without credentials it
/// degrades to a logged no-op so local runs still work end to end.
#[derive(Clone)]
pub struct TwilioMessenger {
    client: reqwest::Client,
    credentials: Option<TwilioCredentials>,
}

impl TwilioMessenger {
    pub fn new(
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: String,
    ) -> Self {
        let credentials = match (account_sid, auth_token) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioCredentials {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => {
                tracing::warn!("Twilio credentials not configured, outbound messages are dropped");
                None
            }
        };
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }
}

impl Messenger for TwilioMessenger {
    fn deliver(&self, recipient: &str, body: &str) {
        let Some(credentials) = self.credentials.clone() else {
            tracing::info!(%recipient, "dropping outbound message, no Twilio credentials");
            return;
        };
        let client = self.client.clone();
        let recipient = recipient.to_string();
        let body = body.to_string();
        tokio::spawn(async move {
            let url = format!(
                "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
                credentials.account_sid
            );
            let result = client
                .post(&url)
                .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
                .form(&[
                    ("To", recipient.as_str()),
                    ("From", credentials.from_number.as_str()),
                    ("Body", body.as_str()),
                ])
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(%recipient, "outbound message accepted");
                }
                Ok(response) => {
                    let status = response.status();
                    let detail = response
                        .json::<serde_json::Value>()
                        .await
                        .ok()
                        .and_then(|value| {
                            value.get("message").and_then(|m| m.as_str()).map(String::from)
                        })
                        .unwrap_or_default();
                    tracing::error!(%recipient, %status, %detail, "Twilio rejected outbound message");
                }
                Err(err) => tracing::error!(%recipient, %err, "failed to reach Twilio"),
            }
        });
    }
}

/// Scheduler on tokio timers. Each job sleeps until its fire time, then
/// re-validates the appointment against the store before delivering, since a
/// booking may have been cancelled or replaced in the meantime.
#[derive(Clone)]
pub struct TokioScheduler<A, M> {
    appointments: A,
    messenger: M,
    reminder_lead: Duration,
    feedback_delay: Duration,
    feedback_link: String,
}

impl<A: AppointmentBackend, M: Messenger> TokioScheduler<A, M> {
    pub fn new(
        appointments: A,
        messenger: M,
        reminder_lead: Duration,
        feedback_delay: Duration,
        feedback_link: String,
    ) -> Self {
        Self {
            appointments,
            messenger,
            reminder_lead,
            feedback_delay,
            feedback_link,
        }
    }

    fn schedule_at(&self, at: DateTime<Local>, appointment: Appointment, body: String) {
        let appointments = self.appointments.clone();
        let messenger = self.messenger.clone();
        tokio::spawn(async move {
            // A fire time already in the past fires immediately.
            let wait = (at - Local::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            match appointments.find_by_requester(&appointment.requester) {
                Ok(Some(active))
                    if active.date == appointment.date && active.time == appointment.time =>
                {
                    messenger.deliver(&appointment.requester, &body);
                }
                Ok(_) => tracing::debug!(
                    requester = %appointment.requester,
                    "appointment no longer active, skipping notification"
                ),
                Err(err) => {
                    tracing::error!(%err, "could not re-validate appointment before notifying");
                }
            }
        });
    }
}

fn starts_at(appointment: &Appointment) -> DateTime<Local> {
    let naive = appointment.date.and_time(appointment.time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(Local::now)
}

impl<A: AppointmentBackend, M: Messenger> NotificationScheduler for TokioScheduler<A, M> {
    fn schedule_reminder(&self, appointment: &Appointment) {
        let body = format!(
            "Reminder: you have an appointment on {} at {}.",
            format_date(appointment.date),
            format_time(appointment.time)
        );
        self.schedule_at(
            starts_at(appointment) - self.reminder_lead,
            appointment.clone(),
            body,
        );
    }

    fn schedule_feedback_prompt(&self, appointment: &Appointment) {
        let body = format!(
            "Thank you for your visit! Please share your feedback here: {}",
            self.feedback_link
        );
        self.schedule_at(
            starts_at(appointment) + self.feedback_delay,
            appointment.clone(),
            body,
        );
    }
}
