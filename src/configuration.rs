use chrono::Duration;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn bind_address(&self) -> String;
    fn admin_numbers(&self) -> Vec<String>;
    fn feedback_link(&self) -> String;
    fn allow_multiple_bookings(&self) -> bool;
    fn reminder_lead(&self) -> Duration;
    fn feedback_delay(&self) -> Duration;
    fn twilio_account_sid(&self) -> Option<String>;
    fn twilio_auth_token(&self) -> Option<String>;
    fn twilio_from_number(&self) -> String;
}
