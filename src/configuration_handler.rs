use chrono::Duration;
use clap::Parser;

use crate::configuration::Configuration;

// Twilio Sandbox Number
const DEFAULT_FROM_NUMBER: &str = "whatsapp:+14155238886";

#[derive(Parser, Debug, Clone)]
#[command(about = "WhatsApp slot-booking bot backend")]
pub struct ConfigurationHandler {
    /// Address the webhook server binds to.
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind_address: String,

    /// Channel identities with admin access, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "whatsapp:+918860397260")]
    admin_numbers: Vec<String>,

    /// Link sent with feedback prompts.
    #[arg(long, default_value = "https://feedback-form.example.com")]
    feedback_link: String,

    /// Let a requester book again while an appointment is still active; the
    /// new booking replaces the old one.
    #[arg(long)]
    allow_multiple_bookings: bool,

    /// Minutes before the slot start at which the reminder fires.
    #[arg(long, default_value_t = 60)]
    reminder_lead_minutes: i64,

    /// Minutes after the slot start at which the feedback prompt fires.
    #[arg(long, default_value_t = 30)]
    feedback_delay_minutes: i64,
}

impl Configuration for ConfigurationHandler {
    fn bind_address(&self) -> String {
        self.bind_address.clone()
    }

    fn admin_numbers(&self) -> Vec<String> {
        self.admin_numbers.clone()
    }

    fn feedback_link(&self) -> String {
        self.feedback_link.clone()
    }

    fn allow_multiple_bookings(&self) -> bool {
        self.allow_multiple_bookings
    }

    fn reminder_lead(&self) -> Duration {
        Duration::minutes(self.reminder_lead_minutes)
    }

    fn feedback_delay(&self) -> Duration {
        Duration::minutes(self.feedback_delay_minutes)
    }

    fn twilio_account_sid(&self) -> Option<String> {
        std::env::var("TWILIO_ACCOUNT_SID").ok()
    }

    fn twilio_auth_token(&self) -> Option<String> {
        std::env::var("TWILIO_AUTH_TOKEN").ok()
    }

    fn twilio_from_number(&self) -> String {
        std::env::var("TWILIO_PHONE_NUMBER").unwrap_or_else(|_| DEFAULT_FROM_NUMBER.to_string())
    }
}
