//! # Solmate
//!
//! HTTP backend for the Solmate virtual pet: the axum router, the service
//! layer that runs engine operations through the store, and the periodic
//! jobs.

pub mod api;
pub mod error;
pub mod jobs;
pub mod service;

pub use api::{router, AppState};
pub use error::{AppError, Result};
pub use service::SolmateService;
