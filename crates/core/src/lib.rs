//! # Agapay Core
//!
//! Screen controllers for the Agapay triage demo.
//!
//! This crate holds the state behind each screen and the storage it needs:
//! - [`intake::IntakeFlow`]: the field worker's intake, assessment and referral steps
//! - [`companion::CitizenCompanion`]: medication schedule, symptom reports and chat
//! - [`dashboard::AdminDashboard`]: mock logistics datasets and the generated report
//! - [`history::PatientHistory`] over an injected [`store::KeyValueStore`]
//!
//! Model calls go through [`agapay_gateway::AgapayAssistant`], which never returns an error.
//!
//! **No API concerns**: HTTP servers and command-line parsing belong in `api-rest` and `cli`.

pub mod companion;
pub mod config;
pub mod constants;
pub mod dashboard;
mod error;
pub mod history;
pub mod intake;
pub mod store;

pub use agapay_types::NonEmptyText;
pub use config::CoreConfig;
pub use constants::{DEFAULT_BARANGAY, DEFAULT_DATA_DIR};
pub use error::{AgapayError, AgapayResult};
