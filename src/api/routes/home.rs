use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{escape_markup, parse_cookies, ApiError};
use crate::models::{MessageEntry, Speaker};

/// Cookie holding the signed-in credential.
pub const SESSION_COOKIE: &str = "CT_CR";

/// Which page the landing route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    SignIn,
    Home,
}

impl Flow {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let signed_in = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|cookie| parse_cookies(cookie).contains_key(SESSION_COOKIE));
        if signed_in {
            Flow::Home
        } else {
            Flow::SignIn
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::SignIn => "sign-in",
            Flow::Home => "home",
        }
    }
}

pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, ApiError> {
    let flow = Flow::from_headers(&headers);

    let messages = match flow {
        Flow::Home => state
            .message_log
            .read()
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        Flow::SignIn => Vec::new(),
    };

    Ok(Html(render_page(
        flow,
        &state.scorer.participants().to_string(),
        &messages,
    )))
}

fn render_page(flow: Flow, title: &str, messages: &[MessageEntry]) -> String {
    let mut page = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body data-flow=\"{}\">\n",
        escape_markup(title),
        flow.as_str()
    );

    match flow {
        Flow::SignIn => {
            page.push_str("<form id=\"sign-in\" method=\"post\" action=\"/login\">\n");
            page.push_str("<input name=\"credential\" type=\"password\">\n");
            page.push_str("<button type=\"submit\">Sign in</button>\n</form>\n");
        }
        Flow::Home => {
            page.push_str("<ul id=\"messages\">\n");
            for entry in messages {
                let class = match entry.who {
                    Speaker::Sender => "sender",
                    Speaker::Receiver => "receiver",
                };
                page.push_str(&format!(
                    "<li class=\"{}\">{}</li>\n",
                    class,
                    escape_markup(&entry.body).replace('\n', "<br>")
                ));
            }
            page.push_str("</ul>\n");
            page.push_str("<form id=\"send\" method=\"post\" action=\"/send\">\n");
            page.push_str("<input name=\"message\" placeholder=\"Jess by 5. Catan\">\n");
            page.push_str("<button type=\"submit\">Send</button>\n</form>\n");
        }
    }

    page.push_str(FORM_SCRIPT);
    page.push_str("</body>\n</html>\n");
    page
}

// Both forms post their single field as JSON and reload.
const FORM_SCRIPT: &str = r#"<script type="text/javascript">
for (const form of document.querySelectorAll("form")) {
  form.addEventListener("submit", async (event) => {
    event.preventDefault();
    const input = form.querySelector("input");
    await fetch(form.action, {
      method: "POST",
      headers: { "content-type": "application/json" },
      body: JSON.stringify({ [input.name]: input.value }),
    });
    location.reload();
  });
}
</script>
"#;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub credential: String,
}

/// Store the credential in the session cookie.
pub async fn login(Json(request): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    let credential = request.credential.trim();
    if credential.is_empty() {
        return Err(ApiError::BadRequest("credential is required".to_string()));
    }
    if !credential.chars().all(is_cookie_octet) {
        return Err(ApiError::BadRequest(
            "credential contains characters not allowed in a cookie".to_string(),
        ));
    }

    tracing::info!("Signed in");
    let cookie = format!("{}={}; HttpOnly", SESSION_COOKIE, credential);
    Ok(([(header::SET_COOKIE, cookie)], "login success"))
}

// RFC 6265 cookie-octet
fn is_cookie_octet(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '"' | ',' | ';' | '\\')
}
