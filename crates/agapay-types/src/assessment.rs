use serde::{Deserialize, Serialize};

/// Triage risk level, ordered by urgency (`Green < Yellow < Red`).
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Green,
    Yellow,
    Red,
}

impl RiskLevel {
    /// The care setting a patient at this level should be directed to.
    pub fn care_setting(self) -> &'static str {
        match self {
            RiskLevel::Green => "Home Care",
            RiskLevel::Yellow => "Teleconsult / Clinic Visit",
            RiskLevel::Red => "Emergency Referral",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Green => "GREEN",
            RiskLevel::Yellow => "YELLOW",
            RiskLevel::Red => "RED",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a guided physical exam check, as marked by the field worker.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamFinding {
    Positive,
    Negative,
}

/// A physical exam step suggested by the model.
///
/// `is_checked` and `finding` are filled in on the device only. They are never sent back to the
/// model and do not feed into the risk level.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalExamCheck {
    pub id: String,
    /// Instruction for the field worker, e.g. "Check capillary refill time".
    pub prompt: String,
    /// What counts as a positive finding, e.g. "> 2 seconds".
    pub expected_finding: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding: Option<ExamFinding>,
}

/// Structured clinical decision support result.
///
/// Produced by the gateway from model JSON, or substituted by [`ClinicalAssessment::fallback`]
/// when the call fails. Not mutated after creation.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalAssessment {
    pub risk_level: RiskLevel,
    pub provisional_classification: String,
    pub reasoning: String,
    pub immediate_actions: Vec<String>,
    pub physical_exam_prompts: Vec<PhysicalExamCheck>,
    pub recommended_medications: Vec<String>,
}

impl ClinicalAssessment {
    /// Safe-mode assessment used whenever the model cannot be reached or answers with something
    /// that is not a valid assessment.
    pub fn fallback() -> Self {
        Self {
            risk_level: RiskLevel::Yellow,
            provisional_classification: "Assessment Unavailable".into(),
            reasoning: "AI Service Disconnected. Proceed with standard manual protocols.".into(),
            immediate_actions: vec![
                "Monitor vitals".into(),
                "Consult supervisor manually".into(),
            ],
            physical_exam_prompts: Vec::new(),
            recommended_medications: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_levels_order_by_urgency() {
        assert!(RiskLevel::Green < RiskLevel::Yellow);
        assert!(RiskLevel::Yellow < RiskLevel::Red);
    }

    #[test]
    fn risk_level_uses_upper_case_on_the_wire() {
        let json = serde_json::to_string(&RiskLevel::Red).expect("should serialise");
        assert_eq!(json, "\"RED\"");
        let parsed: RiskLevel = serde_json::from_str("\"GREEN\"").expect("should parse");
        assert_eq!(parsed, RiskLevel::Green);
    }

    #[test]
    fn lower_case_risk_level_is_rejected() {
        let parsed: Result<RiskLevel, _> = serde_json::from_str("\"red\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn fallback_is_yellow_with_empty_lists() {
        let fallback = ClinicalAssessment::fallback();
        assert_eq!(fallback.risk_level, RiskLevel::Yellow);
        assert!(fallback.physical_exam_prompts.is_empty());
        assert!(fallback.recommended_medications.is_empty());
        assert_eq!(fallback.immediate_actions.len(), 2);
    }

    #[test]
    fn parses_model_json_without_client_side_fields() {
        let raw = r#"{
            "riskLevel": "RED",
            "provisionalClassification": "Severe Dengue (suspected)",
            "reasoning": "High fever with hypotension.",
            "immediateActions": ["Refer to hospital"],
            "physicalExamPrompts": [
                {"id": "cap-refill", "prompt": "Check capillary refill", "expectedFinding": "> 2 seconds"}
            ],
            "recommendedMedications": ["Paracetamol"]
        }"#;
        let assessment: ClinicalAssessment = serde_json::from_str(raw).expect("should parse");
        assert_eq!(assessment.risk_level, RiskLevel::Red);
        assert_eq!(assessment.physical_exam_prompts[0].is_checked, None);
        assert_eq!(assessment.physical_exam_prompts[0].finding, None);

        let back = serde_json::to_value(&assessment).expect("should serialise");
        assert!(back["physicalExamPrompts"][0].get("isChecked").is_none());
    }
}
