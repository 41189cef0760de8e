//! `POST /websms` - the forwarding client's webhook.
//!
//! Only the credential and the presence of `text` are validated. Once a message is
//! accepted the client always gets `200`, whatever ingestion decides; processing
//! failures are logged and never surface to the sender.

use super::{AppState, extract::ApiSubmitter};
use crate::{
    core::ingest::{ingest, preview, text_length},
    errors::{Error, Result},
};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Debug, Deserialize)]
pub struct WebSmsPayload {
    #[serde(default)]
    pub text: Option<String>,
}

/// Acknowledgement echoed to the sender
#[derive(Debug, Serialize)]
pub struct WebSmsAck {
    pub ok: bool,
    pub received_at: DateTime<Utc>,
    pub text: String,
}

pub async fn receive(
    State(state): State<AppState>,
    ApiSubmitter(submitter): ApiSubmitter,
    payload: Option<Json<WebSmsPayload>>,
) -> Result<Json<WebSmsAck>> {
    let text = payload
        .and_then(|Json(payload)| payload.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(Error::TextRequired)?;

    let received_at = Utc::now();
    info!(
        group_id = submitter.group_id,
        %received_at,
        text_length = text_length(&text),
        preview = %preview(&text),
        "WebSMS received"
    );

    match ingest(&*state.db, state.parser, &submitter, &text, received_at).await {
        Ok(outcome) => debug!(?outcome, "WebSMS ingested"),
        Err(e) => error!(group_id = submitter.group_id, error = %e, "WebSMS ingestion failed"),
    }

    Ok(Json(WebSmsAck {
        ok: true,
        received_at,
        text,
    }))
}
