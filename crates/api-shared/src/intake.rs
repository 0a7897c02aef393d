//! Intake session bodies.

use agapay_core::history::patient_storage_key;
use agapay_core::intake::IntakeFlow;
use agapay_types::{
    ClinicalAssessment, Demographics, ExamFinding, PatientRecord, PhysicalExamCheck,
    ReferralPayload, Vitals,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SymptomsReq {
    /// Comma-separated symptoms, e.g. `"fever, cough"`.
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamFindingReq {
    pub finding: ExamFinding,
}

/// A rendered referral: the payload and the exact string encoded into the scannable code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralRes {
    pub payload: ReferralPayload,
    pub code: String,
}

impl ReferralRes {
    pub fn new(payload: ReferralPayload) -> Result<Self, serde_json::Error> {
        let code = payload.encode()?;
        Ok(Self { payload, code })
    }
}

/// Full state of one intake session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakeSessionRes {
    pub id: String,
    /// `intake`, `assessment` or `referral`.
    pub step: String,
    pub demographics: Demographics,
    pub vitals: Vitals,
    pub symptom_text: String,
    pub symptoms: Vec<String>,
    pub can_generate_assessment: bool,
    pub in_flight: bool,
    pub assessment: Option<ClinicalAssessment>,
    pub exam_checks: Vec<PhysicalExamCheck>,
    /// Stored records for the entered name, newest first.
    pub history: Vec<PatientRecord>,
    pub referral: Option<ReferralRes>,
}

impl IntakeSessionRes {
    pub fn from_flow(id: impl Into<String>, flow: &IntakeFlow) -> Result<Self, serde_json::Error> {
        let referral = flow.referral().cloned().map(ReferralRes::new).transpose()?;
        Ok(Self {
            id: id.into(),
            step: flow.step().as_str().to_string(),
            demographics: flow.demographics().clone(),
            vitals: *flow.vitals(),
            symptom_text: flow.symptom_text().to_string(),
            symptoms: flow.symptoms(),
            can_generate_assessment: flow.can_generate_assessment(),
            in_flight: flow.is_in_flight(),
            assessment: flow.assessment().cloned(),
            exam_checks: flow.exam_checks().to_vec(),
            history: flow.history().to_vec(),
            referral,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientHistoryRes {
    /// Storage key the history was read from.
    pub key: String,
    pub records: Vec<PatientRecord>,
}

impl PatientHistoryRes {
    pub fn new(name: &str, records: Vec<PatientRecord>) -> Self {
        Self {
            key: patient_storage_key(name),
            records,
        }
    }
}
