use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::configuration::Configuration;
use crate::configuration_handler::ConfigurationHandler;
use crate::engine::{ConversationEngine, EngineSettings, IncomingHandler};
use crate::http::start_server;
use crate::local_appointments::LocalAppointments;
use crate::local_slots::LocalSlots;
use crate::notifications::{TokioScheduler, TwilioMessenger};

mod backend;
mod configuration;
mod configuration_handler;
mod engine;
mod errors;
mod http;
mod local_appointments;
mod local_slots;
mod notifications;
mod parser;
#[cfg(test)]
mod testutils;
mod types;

#[derive(Clone)]
struct AppState<H: IncomingHandler> {
    handler: H,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let configuration = ConfigurationHandler::parse();

    let slots = LocalSlots::default();
    let appointments = LocalAppointments::default();
    let messenger = TwilioMessenger::new(
        configuration.twilio_account_sid(),
        configuration.twilio_auth_token(),
        configuration.twilio_from_number(),
    );
    let scheduler = TokioScheduler::new(
        appointments.clone(),
        messenger.clone(),
        configuration.reminder_lead(),
        configuration.feedback_delay(),
        configuration.feedback_link(),
    );
    let engine = ConversationEngine::new(
        slots,
        appointments,
        messenger,
        scheduler,
        EngineSettings {
            admin_numbers: configuration.admin_numbers(),
            feedback_link: configuration.feedback_link(),
            allow_multiple_bookings: configuration.allow_multiple_bookings(),
        },
    );

    let state = AppState { handler: engine };
    start_server(state, &configuration.bind_address()).await;
}
