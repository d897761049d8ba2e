//! HTTP handlers for the server.

pub mod devices;
pub mod receipt;
