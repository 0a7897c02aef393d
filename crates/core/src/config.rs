//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services, so request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_BARANGAY, DEFAULT_DATA_DIR, STORE_DIR_NAME};
use crate::{AgapayError, AgapayResult, NonEmptyText};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    barangay: NonEmptyText,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `AgapayError::InvalidInput` if `barangay` is blank.
    pub fn new(data_dir: PathBuf, barangay: &str) -> AgapayResult<Self> {
        let barangay = NonEmptyText::new(barangay)
            .map_err(|_| AgapayError::InvalidInput("barangay cannot be empty".into()))?;

        Ok(Self { data_dir, barangay })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory backing the file key-value store.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join(STORE_DIR_NAME)
    }

    /// Barangay the field worker is assigned to; stamped onto every new record.
    pub fn barangay(&self) -> &str {
        self.barangay.as_str()
    }
}

/// Resolve the data directory from an optional string value.
///
/// If `value` is `None` or blank, returns [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Resolve the barangay from an optional string value, defaulting to [`DEFAULT_BARANGAY`].
pub fn barangay_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BARANGAY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_barangay_is_rejected() {
        let err = CoreConfig::new(PathBuf::from("data"), "  ").expect_err("should fail");
        assert!(matches!(err, AgapayError::InvalidInput(_)));
    }

    #[test]
    fn store_dir_is_under_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("data"), "Poblacion").expect("should build");
        assert_eq!(cfg.store_dir(), PathBuf::from("data").join(STORE_DIR_NAME));
        assert_eq!(cfg.barangay(), "Poblacion");
    }

    #[test]
    fn env_values_fall_back_to_defaults() {
        assert_eq!(data_dir_from_env_value(None), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            data_dir_from_env_value(Some(" /tmp/agapay ".into())),
            PathBuf::from("/tmp/agapay")
        );
        assert_eq!(barangay_from_env_value(Some("".into())), DEFAULT_BARANGAY);
    }
}
