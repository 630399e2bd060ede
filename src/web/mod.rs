//! Local JSON API for the chat assistant.
//!
//! A lightweight HTTP server (sync, via `tiny_http`) exposing the chat
//! pipeline to a browser or script:
//!
//! - `GET  /api/messages`: the chat log
//! - `POST /api/messages`: send `{"text": ...}`
//! - `POST /api/quick-reply`: send `{"label": ...}`
//! - `POST /api/clear`: reset to the welcome message
//! - `GET  /api/stats`: turn analytics
//! - `GET  /api/health`: configuration and collaborator status
//!
//! Launched via `aura web` (default: `http://127.0.0.1:9747`).

pub mod api;

use std::io::Cursor;

use anyhow::Result;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::assistant::Assistant;
use crate::capability::SpeechCapability;

use api::ApiReply;

/// Everything a request handler may touch.
pub struct WebState {
    pub assistant: Assistant,
    pub speech: SpeechCapability,
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the API server on the given address.
///
/// Blocks the current thread and handles requests sequentially, so turns
/// never interleave.
pub fn serve(addr: &str, mut state: WebState) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("aura API running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = dispatch(&mut state, &method, &url, body.as_deref()).unwrap_or_else(|e| {
            ApiReply {
                status: 500,
                body: serde_json::json!({ "error": format!("{e:#}") }),
            }
        });
        let status = reply.status;
        let _ = request.respond(into_response(reply));

        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Route a request to its handler.
pub fn dispatch(
    state: &mut WebState,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<ApiReply> {
    let path = url.split('?').next().unwrap_or(url);
    let body = body.unwrap_or("{}");

    match (method, path) {
        (&Method::Get, "/") => Ok(index()),
        (&Method::Get, "/api/messages") => api::get_messages(state),
        (&Method::Post, "/api/messages") => api::post_message(state, body),
        (&Method::Post, "/api/quick-reply") => api::post_quick_reply(state, body),
        (&Method::Post, "/api/clear") => api::post_clear(state),
        (&Method::Get, "/api/stats") => api::get_stats(state, url),
        (&Method::Get, "/api/health") => api::get_health(state),
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn index() -> ApiReply {
    ApiReply {
        status: 200,
        body: serde_json::json!({
            "name": "aura",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": [
                "GET /api/messages",
                "POST /api/messages",
                "POST /api/quick-reply",
                "POST /api/clear",
                "GET /api/stats",
                "GET /api/health",
            ],
        }),
    }
}

fn not_found() -> ApiReply {
    ApiReply {
        status: 404,
        body: serde_json::json!({ "error": "not found" }),
    }
}

fn into_response(reply: ApiReply) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(reply.body.to_string().into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(reply.status))
}

/// JSON content type header.
fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}
