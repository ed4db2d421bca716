//! FilePick API Library
//!
//! This crate provides the HTTP handlers, multipart extraction and application setup for
//! the FilePick service.

mod api_doc;
mod handlers;
mod multipart;

pub mod error;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
