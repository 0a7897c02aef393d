//! # API Shared
//!
//! Request and response bodies for the Agapay APIs.
//!
//! Contains:
//! - OpenAPI-described DTOs for each screen (`intake`, `companion`, `dashboard`)
//! - Conversions from the core controllers into those DTOs
//! - `HealthService`
//!
//! Used by `api-rest`; the `agapay` CLI prints the core types directly.

pub mod companion;
pub mod dashboard;
pub mod health;
pub mod intake;

pub use health::{HealthRes, HealthService};
