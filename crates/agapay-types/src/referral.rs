use crate::{ClinicalAssessment, PatientRecord, RecordId, RiskLevel, Vitals};
use serde::{Deserialize, Serialize};

/// Summary handed from the field worker to the receiving facility, rendered as a scannable code.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralPayload {
    pub id: RecordId,
    pub patient: String,
    pub risk: RiskLevel,
    /// Provisional classification.
    pub dx: String,
    pub vitals: Vitals,
}

impl ReferralPayload {
    pub fn new(record: &PatientRecord, assessment: &ClinicalAssessment) -> Self {
        Self {
            id: record.id,
            patient: record.name.clone(),
            risk: assessment.risk_level,
            dx: assessment.provisional_classification.clone(),
            vitals: record.vitals,
        }
    }

    /// Compact JSON, the exact content encoded into the referral code.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
