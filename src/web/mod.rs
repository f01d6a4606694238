//! Web service for distance-server
//!
//! Exposes the distance engine, chart renderer and exporter as JSON
//! endpoints and serves a small front-end for trying them out.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use server::{AppState, router, start_server};
