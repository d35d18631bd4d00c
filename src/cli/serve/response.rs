//! HTTP response writers.

use anyhow::{Result, anyhow};
use serde_json::Value;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::types::{JSON, PLAIN};

/// What a request resolves to, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json(u16, Value),
    Redirect { location: String, permanent: bool },
    NotFound,
    MethodNotAllowed(&'static str),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self::Json(200, body)
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Json(status, serde_json::json!({ "error": message.into() }))
    }

    /// Generic 500; the detail is logged by the caller, never sent.
    pub fn internal() -> Self {
        Self::error(500, "internal server error")
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Json(status, _) => *status,
            Self::Redirect { permanent: true, .. } => 308,
            Self::Redirect { permanent: false, .. } => 307,
            Self::NotFound => 404,
            Self::MethodNotAllowed(_) => 405,
        }
    }
}

/// Write `reply` to `request`. HEAD requests get headers only.
pub fn send(request: Request, reply: Reply) -> Result<()> {
    let head = is_head_request(&request);
    let status = reply.status();

    match reply {
        Reply::Json(_, body) => {
            let body = serde_json::to_vec(&body)?;
            send_body(request, status, JSON, body, head)
        }
        Reply::Redirect { location, .. } => {
            let location = Header::from_bytes("Location", location.as_bytes())
                .map_err(|_| anyhow!("invalid redirect location `{location}`"))?;
            let response = Response::empty(StatusCode(status)).with_header(location);
            request.respond(response)?;
            Ok(())
        }
        Reply::NotFound => send_body(request, status, PLAIN, b"404 Not Found".to_vec(), head),
        Reply::MethodNotAllowed(allow) => {
            let response = Response::from_data(b"405 Method Not Allowed".to_vec())
                .with_status_code(StatusCode(status))
                .with_header(make_header("Content-Type", PLAIN))
                .with_header(make_header("Allow", allow));
            request.respond(response)?;
            Ok(())
        }
    }
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec(), false)
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    head: bool,
) -> Result<()> {
    if head {
        let response = Response::empty(StatusCode(status))
            .with_header(make_header("Content-Type", content_type));
        request.respond(response)?;
        return Ok(());
    }
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
