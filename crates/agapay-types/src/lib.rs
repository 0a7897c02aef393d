//! # Agapay Types
//!
//! Value types shared by the gateway, the screen controllers and the API crates:
//! - [`Vitals`] snapshots taken by a field worker
//! - [`ClinicalAssessment`] results produced by the language-model gateway (or its fallback)
//! - [`PatientRecord`] entries appended to a patient's local history
//! - [`ReferralPayload`], the scannable hand-off to a receiving facility
//!
//! Field names serialise in camelCase so stored records and referral codes stay readable by the
//! mobile front end.

mod assessment;
mod record;
mod referral;
mod vitals;

pub use assessment::{ClinicalAssessment, ExamFinding, PhysicalExamCheck, RiskLevel};
pub use record::{Demographics, Gender, PatientRecord, RecordId};
pub use referral::ReferralPayload;
pub use vitals::Vitals;

/// Errors that can occur when creating validated Agapay values.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// A record identifier was not a millisecond timestamp
    #[error("Invalid record id: {0}")]
    InvalidRecordId(String),
    /// Gender was not one of `M` or `F`
    #[error("Invalid gender: {0}")]
    InvalidGender(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction. Patient names
/// use this type, so `"  Juan "` and `"Juan"` are the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `TypesError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Juan Dela Cruz ").expect("should accept padded name");
        assert_eq!(text.as_str(), "Juan Dela Cruz");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        let err = NonEmptyText::new(" \t ").expect_err("whitespace only should fail");
        assert!(matches!(err, TypesError::Empty));
    }

    #[test]
    fn non_empty_text_deserialise_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
