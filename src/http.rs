use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::engine::IncomingHandler;
use crate::AppState;

/// Inbound webhook payload, the two fields of a Twilio message callback.
#[derive(Debug, Clone, Deserialize)]
struct IncomingMessage {
    #[serde(rename = "Body", default)]
    body: String,
    #[serde(rename = "From", default)]
    from: String,
}

pub async fn start_server<H: IncomingHandler>(state: AppState<H>, bind_address: &str) {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(health))
        .route("/whatsapp", post(whatsapp_reply))
        .with_state(state)
        .layer(cors);

    tracing::info!(%bind_address, "listening for webhook calls");
    let listener = tokio::net::TcpListener::bind(bind_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "Service is running")
}

async fn whatsapp_reply<H: IncomingHandler>(
    State(state): State<AppState<H>>,
    Form(message): Form<IncomingMessage>,
) -> impl IntoResponse {
    let reply = state
        .handler
        .handle_incoming(message.from.trim(), message.body.trim());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        twiml(&reply),
    )
}

/// Wraps the reply in the channel envelope the transport expects.
fn twiml(reply: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        xml_escape(reply)
    )
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutils::RecordingHandler;
    use reqwest::Client;
    use std::time::Duration;
    use tokio::{task::JoinHandle, time::sleep};

    async fn init(port: u16, reply: &str) -> (JoinHandle<()>, RecordingHandler) {
        let handler = RecordingHandler::replying(reply);
        let state = AppState {
            handler: handler.clone(),
        };
        let bind_address = format!("127.0.0.1:{port}");
        let server = tokio::spawn(async move { start_server(state, &bind_address).await });
        sleep(Duration::from_millis(200)).await;
        (server, handler)
    }

    #[tokio::test]
    async fn test_webhook_decodes_form_and_wraps_reply_in_twiml() {
        let (server, handler) = init(3301, "Hello! Welcome to our bot.").await;

        let client = Client::new();
        let response = client
            .post("http://localhost:3301/whatsapp")
            .form(&[("Body", "hi"), ("From", "whatsapp:+111")])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK.as_u16());
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap(),
            "application/xml"
        );
        let content = response.text().await.unwrap();
        assert_eq!(
            content,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>Hello! \
             Welcome to our bot.</Message></Response>"
        );

        let calls = handler.calls();
        assert_eq!(calls, vec![("whatsapp:+111".to_string(), "hi".to_string())]);
        server.abort();
    }

    #[tokio::test]
    async fn test_reply_text_is_xml_escaped() {
        let (server, _) = init(3302, "1 < 2 & 3 > 2").await;

        let client = Client::new();
        let response = client
            .post("http://localhost:3302/whatsapp")
            .form(&[("Body", "hi"), ("From", "whatsapp:+111")])
            .send()
            .await
            .unwrap();

        let content = response.text().await.unwrap();
        assert!(content.contains("<Message>1 &lt; 2 &amp; 3 &gt; 2</Message>"));
        server.abort();
    }

    #[tokio::test]
    async fn test_missing_form_fields_still_produce_a_reply() {
        let (server, handler) = init(3303, "fallback").await;

        let client = Client::new();
        let response = client
            .post("http://localhost:3303/whatsapp")
            .form(&[("Unrelated", "x")])
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK.as_u16());
        assert_eq!(handler.calls(), vec![(String::new(), String::new())]);
        server.abort();
    }

    #[tokio::test]
    async fn test_health_probe() {
        let (server, handler) = init(3304, "unused").await;

        let client = Client::new();
        let response = client.get("http://localhost:3304/").send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK.as_u16());
        assert_eq!(response.text().await.unwrap(), "Service is running");
        assert!(handler.calls().is_empty());
        server.abort();
    }
}
