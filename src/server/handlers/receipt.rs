//! Ticket receipt handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::selector::FixedAddress;
use crate::session::{FailureReason, PrintReport};
use crate::ticket::Ticket;

use super::super::state::AppState;

/// Body of POST /api/receipt/print.
#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub ticket: Ticket,
    /// Bluetooth address of the printer, as listed by /api/devices
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResponse {
    pub success: bool,
    pub state: &'static str,
    /// Id printed in the QR code, generated if the request had none
    pub ticket_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PrintReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

fn failure_status(reason: &FailureReason) -> StatusCode {
    match reason {
        FailureReason::PermissionDenied => StatusCode::FORBIDDEN,
        FailureReason::BluetoothDisabled => StatusCode::SERVICE_UNAVAILABLE,
        FailureReason::NoDevicesFound | FailureReason::SelectionCancelled => StatusCode::NOT_FOUND,
        FailureReason::Busy => StatusCode::CONFLICT,
        FailureReason::DiscoveryFailed(_)
        | FailureReason::ConnectionFailed(_)
        | FailureReason::TransmissionFailed { .. } => StatusCode::BAD_GATEWAY,
    }
}

/// Handle POST /api/receipt/print - run a print session for the ticket.
///
/// Empty ticket id, confirmation code and date are generated first, as for
/// /api/tickets/issue.
pub async fn print(State(state): State<Arc<AppState>>, Json(request): Json<PrintRequest>) -> Response {
    let PrintRequest { mut ticket, address } = request;
    ticket.fill_generated(state.clock.as_ref(), &mut rand::rng());

    let mut prompt = FixedAddress(address.clone());
    let result = state.session.start(&ticket, &mut prompt).await;
    let session_state = state.session.state().name();

    match result {
        Ok(report) => (
            StatusCode::OK,
            Json(PrintResponse {
                success: true,
                state: session_state,
                ticket_id: ticket.ticket_id,
                report: Some(report),
                error: None,
                code: None,
                hint: None,
            }),
        )
            .into_response(),
        Err(reason) => {
            // With a fixed address, a cancelled selection means the printer was not seen.
            let error = match &reason {
                FailureReason::SelectionCancelled => {
                    format!("Printer {} was not found", address)
                }
                other => other.to_string(),
            };
            (
                failure_status(&reason),
                Json(PrintResponse {
                    success: false,
                    state: session_state,
                    ticket_id: ticket.ticket_id,
                    report: None,
                    error: Some(error),
                    code: Some(reason.code()),
                    hint: reason
                        .hint()
                        .or(Some("Scan again and pick a listed printer.")),
                }),
            )
                .into_response()
        }
    }
}

/// Handle POST /api/receipt/preview - plain text preview of the ticket.
pub async fn preview(State(state): State<Arc<AppState>>, Json(ticket): Json<Ticket>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.session.formatter().preview(&ticket),
    )
}

/// Handle POST /api/tickets/issue - fill in ticket id, code and date.
pub async fn issue(State(state): State<Arc<AppState>>, Json(mut ticket): Json<Ticket>) -> Json<Ticket> {
    ticket.fill_generated(state.clock.as_ref(), &mut rand::rng());
    Json(ticket)
}
