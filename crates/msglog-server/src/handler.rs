use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::{Message as WsFrame, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Json, Response};
use msglog_query::find_page;
use msglog_types::{AttachmentName, MessageId};
use serde::Serialize;
use tracing::{debug, info};

use crate::command::Command;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub messages: usize,
    pub subscribers: usize,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn info_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "msglog",
        version: env!("CARGO_PKG_VERSION"),
        messages: state.store().len(),
        subscribers: state.broadcaster().subscriber_count(),
    })
}

/// Single entry point for `/?method=...` requests.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> ServerResult<Response> {
    let command = Command::parse(&method, &params, &body, state.config().default_page_size)?;
    debug!(command = command.name(), "dispatching");
    execute(state, command).await
}

async fn execute(state: AppState, command: Command) -> ServerResult<Response> {
    match command {
        Command::AddMessage(request) => {
            let pipeline = state.pipeline().clone();
            let message = tokio::task::spawn_blocking(move || pipeline.create_message(request))
                .await
                .map_err(|e| ServerError::Internal(e.to_string()))??;
            Ok(Json(&*message).into_response())
        }
        Command::GetPage(query) => {
            let messages = state.store().messages();
            let page = find_page(&messages, &query)?;
            Ok(Json(page).into_response())
        }
        Command::GetMessage(id) => {
            let message = state.store().get(id)?;
            Ok(Json(&*message).into_response())
        }
        Command::DownloadAttachment { message_id, name } => {
            download(state, message_id, name).await
        }
    }
}

async fn download(state: AppState, message_id: MessageId, name: AttachmentName) -> ServerResult<Response> {
    let attachments = state.attachments().clone();
    let lookup = name.clone();
    let bytes = tokio::task::spawn_blocking(move || attachments.read(message_id, &lookup))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        name.as_str().replace('"', "\\\"")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Upgrade to a WebSocket that receives every newly created message.
pub async fn live_feed_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| live_feed(socket, state))
}

async fn live_feed(mut socket: WebSocket, state: AppState) {
    let broadcaster = state.broadcaster().clone();
    let mut subscription = broadcaster.subscribe();
    let id = subscription.id();
    info!(subscription = %id, "live subscriber connected");

    loop {
        tokio::select! {
            pushed = subscription.recv() => match pushed {
                Some(payload) => {
                    if socket.send(WsFrame::Text(payload.to_string())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            incoming = socket.recv() => match incoming {
                // Client frames carry no meaning.
                Some(Ok(WsFrame::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    broadcaster.unsubscribe(id);
    info!(subscription = %id, "live subscriber disconnected");
}
