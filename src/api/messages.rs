use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::error::AppError;
use crate::store::{Message, MessageKind};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub session_id: String,
    pub sender_id: Option<String>,
    pub kind: Option<String>,
    pub payload: Option<PayloadFields>,
    pub file_name: Option<String>,
}

/// Wire shape of the payload; presence of both fields is checked by the
/// store, which treats them as opaque.
#[derive(Debug, Deserialize)]
pub struct PayloadFields {
    pub ciphertext: Option<String>,
    pub nonce: Option<String>,
}

/// POST /api/messages/send
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>, AppError> {
    let kind = MessageKind::parse(req.kind.as_deref().unwrap_or(""));
    let (ciphertext, nonce) = match req.payload {
        Some(p) => (p.ciphertext, p.nonce),
        None => (None, None),
    };

    let message = state
        .store
        .post_message(
            &req.session_id,
            req.sender_id,
            kind,
            ciphertext,
            nonce,
            req.file_name,
        )
        .await?;

    Ok(Json(message))
}

/// GET /api/messages/:session_id
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state.store.list_messages(&session_id).await?;

    Ok(Json(messages))
}
