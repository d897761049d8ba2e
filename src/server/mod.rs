//! # HTTP Server for Ticket Printing
//!
//! Lets a booking front end list printers, preview tickets and print them.
//!
//! ## Usage
//!
//! ```bash
//! ticket-printer serve --listen 0.0.0.0:8080
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | GET | `/api/devices?printers_only=true` | | selector view JSON |
//! | POST | `/api/tickets/issue` | ticket | ticket with id, code and date |
//! | POST | `/api/receipt/preview` | ticket | text/plain |
//! | POST | `/api/receipt/print` | `{ ticket, address }` | `{ success, state, ticketId, error, hint }` |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::TicketPrinterError;

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/devices", get(handlers::devices::list))
        .route("/api/tickets/issue", post(handlers::receipt::issue))
        .route("/api/receipt/preview", post(handlers::receipt::preview))
        .route("/api/receipt/print", post(handlers::receipt::print))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: ServerConfig, state: Arc<AppState>) -> Result<(), TicketPrinterError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(listen = %config.listen_addr, "Ticket printer HTTP server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
