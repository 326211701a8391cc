//! OpsDesk: back-office service for a software development agency.
//!
//! Provides pricing estimates, code access request handling with
//! scheduled auto-approval, and content metadata extraction over an
//! HTTP API backed by SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
