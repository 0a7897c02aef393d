use crate::{ClinicalAssessment, TypesError, Vitals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Timestamp-derived record identifier: milliseconds since the Unix epoch, as a decimal string.
///
/// # Monotonicity
///
/// [`RecordId::generate`] given the newest existing id always returns a strictly greater one,
/// bumping by 1 ms when the clock has not moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "openapi",
    derive(utoipa::ToSchema),
    schema(value_type = String)
)]
pub struct RecordId(i64);

impl RecordId {
    /// Generate a new record id, strictly after `last` when one is provided.
    pub fn generate(last: Option<&RecordId>) -> Self {
        Self::generate_at(Utc::now(), last)
    }

    fn generate_at(now: DateTime<Utc>, last: Option<&RecordId>) -> Self {
        let millis = now.timestamp_millis();
        match last {
            Some(prev) if millis <= prev.0 => Self(prev.0 + 1),
            _ => Self(millis),
        }
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    /// The instant this id was derived from, if it is within chrono's range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| TypesError::InvalidRecordId(s.to_string()))
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::M => f.write_str("M"),
            Gender::F => f.write_str("F"),
        }
    }
}

impl FromStr for Gender {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Ok(Gender::M),
            "F" | "FEMALE" => Ok(Gender::F),
            _ => Err(TypesError::InvalidGender(s.to_string())),
        }
    }
}

/// Patient details collected at the top of the intake form.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub barangay: String,
}

/// One completed assessment, as stored in a patient's local history.
///
/// Records are append-only: once written they are never updated or deleted.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: RecordId,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub barangay: String,
    pub symptoms: Vec<String>,
    pub vitals: Vitals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<ClinicalAssessment>,
    pub timestamp: DateTime<Utc>,
}
