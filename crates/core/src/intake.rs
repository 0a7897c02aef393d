//! Field-worker intake flow.
//!
//! The flow moves through three steps:
//!
//! ```text
//! intake --generate--> assessment --referral--> referral
//!    ^                     |                       |
//!    +-------back----------+                       |
//!    +---------------start new intake--------------+
//! ```
//!
//! Generating an assessment is split into [`IntakeFlow::begin_assessment`] and
//! [`IntakeFlow::complete_assessment`] so a caller holding the flow behind a lock can release it
//! while the gateway call is outstanding. [`IntakeFlow::generate_assessment`] does both for callers
//! that own the flow outright.
//!
//! Storage is written in exactly one place: [`IntakeFlow::create_referral`].

use crate::history::PatientHistory;
use crate::{AgapayError, AgapayResult};
use agapay_gateway::AgapayAssistant;
use agapay_types::{
    ClinicalAssessment, Demographics, ExamFinding, Gender, NonEmptyText, PatientRecord,
    PhysicalExamCheck, RecordId, ReferralPayload, Vitals,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStep {
    Intake,
    Assessment,
    Referral,
}

impl IntakeStep {
    pub fn as_str(self) -> &'static str {
        match self {
            IntakeStep::Intake => "intake",
            IntakeStep::Assessment => "assessment",
            IntakeStep::Referral => "referral",
        }
    }
}

/// Inputs captured by [`IntakeFlow::begin_assessment`] for the gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequest {
    pub symptoms: Vec<String>,
    pub vitals: Vitals,
    pub age: u32,
    pub gender: Gender,
}

/// Split free-text symptoms on commas, dropping blank fragments.
pub fn parse_symptoms(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct IntakeFlow {
    store: PatientHistory,
    step: IntakeStep,
    demographics: Demographics,
    vitals: Vitals,
    symptom_text: String,
    in_flight: bool,
    assessment: Option<ClinicalAssessment>,
    exam_checks: Vec<PhysicalExamCheck>,
    history: Vec<PatientRecord>,
    referral: Option<ReferralPayload>,
}

impl IntakeFlow {
    /// A blank form for a worker assigned to `barangay`.
    pub fn new(store: PatientHistory, barangay: &str) -> Self {
        Self {
            store,
            step: IntakeStep::Intake,
            demographics: Demographics {
                name: String::new(),
                age: 0,
                gender: Gender::M,
                barangay: barangay.to_string(),
            },
            vitals: Vitals::default(),
            symptom_text: String::new(),
            in_flight: false,
            assessment: None,
            exam_checks: Vec::new(),
            history: Vec::new(),
            referral: None,
        }
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn symptom_text(&self) -> &str {
        &self.symptom_text
    }

    pub fn symptoms(&self) -> Vec<String> {
        parse_symptoms(&self.symptom_text)
    }

    pub fn assessment(&self) -> Option<&ClinicalAssessment> {
        self.assessment.as_ref()
    }

    /// Suggested exam steps with any findings marked so far. Empty outside the assessment step.
    pub fn exam_checks(&self) -> &[PhysicalExamCheck] {
        &self.exam_checks
    }

    /// Stored records for the currently entered name, newest first.
    pub fn history(&self) -> &[PatientRecord] {
        &self.history
    }

    pub fn referral(&self) -> Option<&ReferralPayload> {
        self.referral.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    fn require_editable(&self, action: &'static str) -> AgapayResult<()> {
        if self.step != IntakeStep::Intake {
            return Err(AgapayError::InvalidTransition {
                action,
                step: self.step.as_str(),
            });
        }
        if self.in_flight {
            return Err(AgapayError::Busy("assessment"));
        }
        Ok(())
    }

    /// Replace the patient details.
    ///
    /// The name is trimmed. A blank barangay keeps the current one. When the name changes, the
    /// stored history is re-read for the new name.
    pub fn set_demographics(&mut self, demographics: Demographics) -> AgapayResult<()> {
        self.require_editable("edit demographics")?;

        let name = demographics.name.trim().to_string();
        let name_changed =
            name.to_lowercase() != self.demographics.name.trim().to_lowercase();
        let barangay = match demographics.barangay.trim() {
            "" => self.demographics.barangay.clone(),
            b => b.to_string(),
        };

        self.demographics = Demographics {
            name,
            age: demographics.age,
            gender: demographics.gender,
            barangay,
        };

        if name_changed {
            self.history = if self.demographics.name.is_empty() {
                Vec::new()
            } else {
                self.store.load(&self.demographics.name)
            };
        }
        Ok(())
    }

    pub fn set_vitals(&mut self, vitals: Vitals) -> AgapayResult<()> {
        self.require_editable("edit vitals")?;
        self.vitals = vitals;
        Ok(())
    }

    /// Replace the free-text symptom field (comma-separated).
    pub fn set_symptoms(&mut self, text: impl Into<String>) -> AgapayResult<()> {
        self.require_editable("edit symptoms")?;
        self.symptom_text = text.into();
        Ok(())
    }

    /// Whether the generate control is enabled.
    pub fn can_generate_assessment(&self) -> bool {
        self.step == IntakeStep::Intake && !self.in_flight && !self.symptoms().is_empty()
    }

    /// Mark an assessment call in flight and capture its inputs.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` outside the intake step
    /// - `Busy` if a call is already in flight
    /// - `InvalidInput` if the symptom field is empty
    pub fn begin_assessment(&mut self) -> AgapayResult<AssessmentRequest> {
        self.require_editable("generate an assessment")?;

        let symptoms = self.symptoms();
        if symptoms.is_empty() {
            return Err(AgapayError::InvalidInput("symptoms cannot be empty".into()));
        }

        self.in_flight = true;
        Ok(AssessmentRequest {
            symptoms,
            vitals: self.vitals,
            age: self.demographics.age,
            gender: self.demographics.gender,
        })
    }

    /// Record the gateway's result and move to the assessment step.
    ///
    /// A fallback assessment is accepted like any other.
    pub fn complete_assessment(&mut self, assessment: ClinicalAssessment) -> AgapayResult<()> {
        if self.step != IntakeStep::Intake || !self.in_flight {
            return Err(AgapayError::InvalidTransition {
                action: "complete an assessment",
                step: self.step.as_str(),
            });
        }

        self.in_flight = false;
        self.exam_checks = assessment.physical_exam_prompts.clone();
        self.assessment = Some(assessment);
        self.step = IntakeStep::Assessment;
        Ok(())
    }

    /// Clear the in-flight flag without changing step.
    pub fn abort_assessment(&mut self) {
        self.in_flight = false;
    }

    pub async fn generate_assessment(
        &mut self,
        assistant: &AgapayAssistant,
    ) -> AgapayResult<&ClinicalAssessment> {
        let request = self.begin_assessment()?;
        let assessment = assistant
            .assess_patient_condition(
                &request.symptoms,
                &request.vitals,
                request.age,
                request.gender,
            )
            .await;
        self.complete_assessment(assessment)?;
        self.assessment
            .as_ref()
            .ok_or(AgapayError::InvalidTransition {
                action: "read the assessment",
                step: self.step.as_str(),
            })
    }

    /// Mark a suggested exam step as checked with `finding`.
    ///
    /// Findings stay on this flow. They are not sent to the model and do not change the risk
    /// level.
    pub fn mark_exam_finding(
        &mut self,
        check_id: &str,
        finding: ExamFinding,
    ) -> AgapayResult<&PhysicalExamCheck> {
        if self.step != IntakeStep::Assessment {
            return Err(AgapayError::InvalidTransition {
                action: "mark an exam finding",
                step: self.step.as_str(),
            });
        }

        let check = self
            .exam_checks
            .iter_mut()
            .find(|c| c.id == check_id)
            .ok_or_else(|| AgapayError::NotFound(format!("exam check {check_id}")))?;
        check.is_checked = Some(true);
        check.finding = Some(finding);
        Ok(check)
    }

    /// Return to intake, discarding the assessment. Nothing is persisted.
    pub fn back_to_intake(&mut self) -> AgapayResult<()> {
        if self.step != IntakeStep::Assessment {
            return Err(AgapayError::InvalidTransition {
                action: "go back to intake",
                step: self.step.as_str(),
            });
        }

        self.assessment = None;
        self.exam_checks.clear();
        self.step = IntakeStep::Intake;
        Ok(())
    }

    /// Persist the record and render the referral payload.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` outside the assessment step
    /// - `InvalidInput` if no patient name was entered
    /// - store errors from [`PatientHistory::append`]; the flow stays in the assessment step
    pub fn create_referral(&mut self) -> AgapayResult<ReferralPayload> {
        let assessment = match (&self.step, &self.assessment) {
            (IntakeStep::Assessment, Some(assessment)) => assessment.clone(),
            _ => {
                return Err(AgapayError::InvalidTransition {
                    action: "create a referral",
                    step: self.step.as_str(),
                })
            }
        };

        let name = NonEmptyText::new(&self.demographics.name)
            .map_err(|_| AgapayError::InvalidInput("patient name is required".into()))?;

        let record = PatientRecord {
            id: RecordId::generate(self.history.first().map(|r| &r.id)),
            name: name.as_str().to_string(),
            age: self.demographics.age,
            gender: self.demographics.gender,
            barangay: self.demographics.barangay.clone(),
            symptoms: self.symptoms(),
            vitals: self.vitals,
            assessment: Some(assessment.clone()),
            timestamp: Utc::now(),
        };
        let referral = ReferralPayload::new(&record, &assessment);

        self.history = self.store.append(record)?;
        info!(
            "referral {} created ({} risk, {} stored records)",
            referral.id,
            referral.risk,
            self.history.len()
        );

        self.referral = Some(referral.clone());
        self.step = IntakeStep::Referral;
        Ok(referral)
    }

    /// Start the next assessment for the same patient.
    ///
    /// Clears symptoms, the assessment, exam findings and the referral. Demographics and vitals
    /// are kept.
    pub fn start_new_intake(&mut self) -> AgapayResult<()> {
        if self.step != IntakeStep::Referral {
            return Err(AgapayError::InvalidTransition {
                action: "start a new intake",
                step: self.step.as_str(),
            });
        }

        self.symptom_text.clear();
        self.assessment = None;
        self.exam_checks.clear();
        self.referral = None;
        self.step = IntakeStep::Intake;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use agapay_gateway::{StubGateway, StubReply};
    use agapay_types::RiskLevel;
    use std::sync::Arc;

    const RED_ASSESSMENT: &str = r#"{
        "riskLevel": "RED",
        "provisionalClassification": "Severe Pneumonia",
        "reasoning": "Hypoxia with tachycardia.",
        "immediateActions": ["Refer to RHU now"],
        "physicalExamPrompts": [
            {"id": "crt", "prompt": "Check capillary refill time", "expectedFinding": "> 2 seconds"}
        ],
        "recommendedMedications": []
    }"#;

    fn flow() -> (IntakeFlow, PatientHistory) {
        let history = PatientHistory::new(Arc::new(MemoryStore::new()));
        (IntakeFlow::new(history.clone(), "San Jose"), history)
    }

    fn juan() -> Demographics {
        Demographics {
            name: " Juan Dela Cruz ".into(),
            age: 45,
            gender: Gender::M,
            barangay: String::new(),
        }
    }

    fn assistant(reply: StubReply) -> AgapayAssistant {
        AgapayAssistant::new(Arc::new(StubGateway::new(Vec::new(), reply)))
    }

    #[test]
    fn symptoms_split_on_commas() {
        assert_eq!(
            parse_symptoms(" fever, cough ,, difficulty breathing ,"),
            vec!["fever", "cough", "difficulty breathing"]
        );
        assert!(parse_symptoms(" , ").is_empty());
    }

    #[test]
    fn generate_control_tracks_symptoms_and_in_flight() {
        let (mut flow, _) = flow();
        assert!(!flow.can_generate_assessment());

        flow.set_symptoms("   ").unwrap();
        assert!(!flow.can_generate_assessment());

        flow.set_symptoms("fever").unwrap();
        assert!(flow.can_generate_assessment());

        flow.begin_assessment().expect("begin should succeed");
        assert!(!flow.can_generate_assessment());
        assert!(matches!(
            flow.begin_assessment(),
            Err(AgapayError::Busy(_))
        ));
        assert!(matches!(
            flow.set_symptoms("cough"),
            Err(AgapayError::Busy(_))
        ));

        flow.abort_assessment();
        assert!(flow.can_generate_assessment());
    }

    #[test]
    fn empty_symptoms_cannot_begin() {
        let (mut flow, _) = flow();
        let err = flow.begin_assessment().expect_err("should fail");
        assert!(matches!(err, AgapayError::InvalidInput(_)));
        assert!(!flow.is_in_flight());
    }

    #[test]
    fn name_change_reloads_history() {
        let (mut flow, history) = flow();
        flow.set_demographics(juan()).unwrap();
        flow.set_symptoms("fever").unwrap();
        flow.begin_assessment().unwrap();
        flow.complete_assessment(ClinicalAssessment::fallback())
            .unwrap();
        flow.create_referral().unwrap();
        assert_eq!(history.load("juan dela cruz").len(), 1);

        let mut other = IntakeFlow::new(history.clone(), "San Jose");
        assert!(other.history().is_empty());
        other.set_demographics(juan()).unwrap();
        assert_eq!(other.history().len(), 1);
        assert_eq!(other.demographics().name, "Juan Dela Cruz");
        assert_eq!(other.demographics().barangay, "San Jose");
    }

    #[tokio::test]
    async fn failing_gateway_still_reaches_assessment() {
        let (mut flow, _) = flow();
        flow.set_demographics(juan()).unwrap();
        flow.set_vitals(Vitals {
            temp: 39.5,
            bp_systolic: 90.0,
            bp_diastolic: 60.0,
            pulse: 130.0,
            oxygen: 89.0,
        })
        .unwrap();
        flow.set_symptoms("difficulty breathing").unwrap();

        let assistant = AgapayAssistant::new(Arc::new(StubGateway::always_failing()));
        let assessment = flow
            .generate_assessment(&assistant)
            .await
            .expect("generate should succeed")
            .clone();

        assert_eq!(assessment, ClinicalAssessment::fallback());
        assert_eq!(flow.step(), IntakeStep::Assessment);
        assert!(!flow.is_in_flight());
    }

    #[tokio::test]
    async fn full_cycle_persists_once_and_keeps_demographics() {
        let (mut flow, history) = flow();
        flow.set_demographics(juan()).unwrap();
        flow.set_symptoms("fever, difficulty breathing").unwrap();

        let assistant = assistant(StubReply::Text(RED_ASSESSMENT.into()));
        flow.generate_assessment(&assistant).await.unwrap();
        assert_eq!(flow.exam_checks().len(), 1);
        assert!(history.load("juan dela cruz").is_empty());

        flow.mark_exam_finding("crt", ExamFinding::Positive)
            .expect("mark should succeed");
        assert_eq!(flow.exam_checks()[0].finding, Some(ExamFinding::Positive));
        // The assessment itself is untouched by exam marking.
        assert_eq!(
            flow.assessment().unwrap().physical_exam_prompts[0].finding,
            None
        );

        let referral = flow.create_referral().expect("referral should succeed");
        assert_eq!(referral.patient, "Juan Dela Cruz");
        assert_eq!(referral.risk, RiskLevel::Red);
        assert_eq!(referral.dx, "Severe Pneumonia");
        assert_eq!(flow.step(), IntakeStep::Referral);

        let stored = history.load("Juan Dela Cruz");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, referral.id);
        assert_eq!(stored[0].symptoms, vec!["fever", "difficulty breathing"]);

        flow.start_new_intake().unwrap();
        assert_eq!(flow.step(), IntakeStep::Intake);
        assert_eq!(flow.symptom_text(), "");
        assert!(flow.assessment().is_none());
        assert!(flow.referral().is_none());
        assert_eq!(flow.demographics().name, "Juan Dela Cruz");
        assert_eq!(flow.history().len(), 1);
    }

    #[tokio::test]
    async fn back_discards_without_persisting() {
        let (mut flow, history) = flow();
        flow.set_demographics(juan()).unwrap();
        flow.set_symptoms("cough").unwrap();
        flow.generate_assessment(&assistant(StubReply::Text(RED_ASSESSMENT.into())))
            .await
            .unwrap();

        flow.back_to_intake().unwrap();
        assert_eq!(flow.step(), IntakeStep::Intake);
        assert!(flow.assessment().is_none());
        assert!(flow.exam_checks().is_empty());
        assert_eq!(flow.symptom_text(), "cough");
        assert!(history.load("juan dela cruz").is_empty());
    }

    #[test]
    fn referral_requires_a_name() {
        let (mut flow, _) = flow();
        flow.set_symptoms("fever").unwrap();
        flow.begin_assessment().unwrap();
        flow.complete_assessment(ClinicalAssessment::fallback())
            .unwrap();

        let err = flow.create_referral().expect_err("should fail");
        assert!(matches!(err, AgapayError::InvalidInput(_)));
        assert_eq!(flow.step(), IntakeStep::Assessment);
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let (mut flow, _) = flow();
        assert!(matches!(
            flow.create_referral(),
            Err(AgapayError::InvalidTransition { .. })
        ));
        assert!(matches!(
            flow.back_to_intake(),
            Err(AgapayError::InvalidTransition { .. })
        ));
        assert!(matches!(
            flow.start_new_intake(),
            Err(AgapayError::InvalidTransition { .. })
        ));
        assert!(matches!(
            flow.complete_assessment(ClinicalAssessment::fallback()),
            Err(AgapayError::InvalidTransition { .. })
        ));
        assert!(matches!(
            flow.mark_exam_finding("crt", ExamFinding::Negative),
            Err(AgapayError::InvalidTransition { .. })
        ));
    }
}
