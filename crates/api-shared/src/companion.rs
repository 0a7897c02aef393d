//! Citizen companion bodies.

use agapay_core::companion::{ChatPane, CitizenCompanion, Medication, SentinelSymptom};
use agapay_gateway::TurnRole;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRes {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub remaining: u32,
    pub total: u32,
    pub taken_today: bool,
    pub needs_refill: bool,
}

impl From<&Medication> for MedicationRes {
    fn from(med: &Medication) -> Self {
        Self {
            id: med.id.clone(),
            name: med.name.clone(),
            dosage: med.dosage.clone(),
            frequency: med.frequency.clone(),
            remaining: med.remaining,
            total: med.total,
            taken_today: med.taken_today,
            needs_refill: med.needs_refill(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MedicationsRes {
    pub citizen: String,
    pub medications: Vec<MedicationRes>,
}

impl From<&CitizenCompanion> for MedicationsRes {
    fn from(companion: &CitizenCompanion) -> Self {
        Self {
            citizen: companion.citizen().to_string(),
            medications: companion
                .medications
                .medications()
                .iter()
                .map(MedicationRes::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SymptomReportReq {
    /// One of `Fever`, `Cough`, `Stomach Pain`, `Difficulty Breathing`.
    pub symptom: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SymptomReportRes {
    pub acknowledgment: String,
    /// Everything reported so far, oldest first.
    pub reports: Vec<String>,
}

impl SymptomReportRes {
    pub fn new(acknowledgment: String, reports: &[SentinelSymptom]) -> Self {
        Self {
            acknowledgment,
            reports: reports.iter().map(|s| s.label().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatReq {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatTurnRes {
    /// `user` or `model`.
    pub role: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRes {
    pub transcript: Vec<ChatTurnRes>,
    pub pending: bool,
}

impl From<&ChatPane> for ChatRes {
    fn from(chat: &ChatPane) -> Self {
        Self {
            transcript: chat
                .transcript()
                .iter()
                .map(|turn| ChatTurnRes {
                    role: match turn.role {
                        TurnRole::User => "user".into(),
                        TurnRole::Model => "model".into(),
                    },
                    text: turn.text.clone(),
                })
                .collect(),
            pending: chat.is_pending(),
        }
    }
}
