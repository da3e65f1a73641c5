use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{escape_markup, ApiError};

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub status_code: u16,
    pub body: String,
}

/// Score a message from the web UI and log the exchange.
///
/// Scoring failures still answer 200; the error text is the reply.
pub async fn send_score(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let reply = state.scorer.reply_to(&request.message).await;

    state
        .message_log
        .record_exchange(&request.message, &reply)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(SendResponse {
        status_code: 200,
        body: reply,
    }))
}

/// Inbound SMS webhook (form-encoded, Twilio style).
#[derive(Debug, Deserialize)]
pub struct SmsWebhook {
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Score a texted message and answer with TwiML.
pub async fn sms_webhook(
    State(state): State<AppState>,
    Form(hook): Form<SmsWebhook>,
) -> impl IntoResponse {
    let reply = state.scorer.reply_to(hook.body.trim()).await;
    ([(header::CONTENT_TYPE, "text/xml")], twiml_message(&reply))
}

/// Wrap a reply in a TwiML messaging response.
pub fn twiml_message(reply: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Response><Message><Body>{}</Body></Message></Response>",
        escape_markup(reply)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::api::state::{test_state, test_state_with};
    use crate::models::REQUIRED_FIELDS;
    use crate::sheets::MemorySheet;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    async fn post_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn post_form(app: axum::Router, uri: &str, body: &str) -> (StatusCode, String, String) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_twiml_escapes_reply() {
        assert_eq!(
            twiml_message("Jess & Dan <3"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Response><Message><Body>Jess &amp; Dan &lt;3</Body></Message></Response>"
        );
    }

    #[test]
    fn test_send_response_shape() {
        let json = serde_json::to_value(SendResponse {
            status_code: 200,
            body: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"statusCode": 200, "body": "hi"}));
    }

    #[tokio::test]
    async fn test_send_scores_and_logs() {
        let state = test_state();
        let log = state.message_log.clone();
        let app = build_router(state);

        let (status, json) = post_json(app, "/send", r#"{"message": "Jess by 5.Catan"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["statusCode"], 200);
        let body = json["body"].as_str().unwrap();
        assert!(body.starts_with("Congrats Jess!\n"), "{}", body);

        let entries = log.read().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].body, "Jess by 5.Catan");
        assert_eq!(entries[1].body, body);
    }

    #[tokio::test]
    async fn test_send_format_error_is_logged_reply() {
        let state = test_state();
        let log = state.message_log.clone();
        let app = build_router(state);

        let (status, json) = post_json(app, "/send", r#"{"message": "Jess by 5"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["body"],
            "FormatError: The message was not sent in the correct format. \
             The second sentence should be the game name"
        );
        assert_eq!(log.read().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_send_rejects_bad_body() {
        let app = build_router(test_state());
        let (status, _) = post_json(app, "/send", r#"{"text": "Jess by 5.Catan"}"#).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_sms_replies_with_twiml() {
        let sheet = Arc::new(MemorySheet::with_header("Sheet1", &REQUIRED_FIELDS));
        let state = test_state_with(sheet.clone());
        let log = state.message_log.clone();
        let app = build_router(state);

        let (status, content_type, body) =
            post_form(app, "/sms", "Body=Dan+by+3.Azul.Rainy&From=%2B15550100").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/xml");
        assert!(body.contains("<Body>Congrats Dan!\n"), "{}", body);
        assert_eq!(sheet.rows().len(), 2);
        // The SMS channel keeps no message log
        assert!(log.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sms_store_down_replies_with_error() {
        let sheet = Arc::new(MemorySheet::with_header("Sheet1", &REQUIRED_FIELDS));
        sheet.set_unavailable(true);
        let app = build_router(test_state_with(sheet));

        let (status, _, body) = post_form(app, "/sms", "Body=Jess+by+5.Catan").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<Body>StoreUnavailable: "), "{}", body);
    }
}
