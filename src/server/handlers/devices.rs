//! Device discovery handler.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::selector::{DeviceSelector, SelectorView};

use super::super::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeviceQuery {
    #[serde(default)]
    pub printers_only: bool,
}

/// Handle GET /api/devices - scan and return the selector view.
pub async fn list(State(state): State<Arc<AppState>>, Query(query): Query<DeviceQuery>) -> Response {
    let mut selector = DeviceSelector::new().with_printers_only(query.printers_only);
    selector.begin_scan();
    let result = state.discovery.scan().await;
    selector.finish_scan(&result);

    let view = selector.view();
    let status = match view {
        SelectorView::Error { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    (status, Json(view)).into_response()
}
