//! The three model-backed operations the screens use, each with a fixed fallback.

use crate::prompts::{
    assessment_prompt, assessment_schema, logistics_prompt, CDSS_SYSTEM_INSTRUCTION,
    COMPANION_SYSTEM_INSTRUCTION, LOGISTICS_SYSTEM_INSTRUCTION,
};
use crate::{ChatTurn, GatewayError, GatewayRequest, GatewayResult, LlmGateway};
use agapay_types::{ClinicalAssessment, Gender, Vitals};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

/// Companion chat reply used when the model cannot be reached.
pub const CHAT_FALLBACK: &str = "Pasensya na, hindi ako makakonekta sa server ngayon. Mangyaring pumunta sa Health Center kung masama ang pakiramdam.";

/// Logistics report used when the model cannot be reached.
pub const LOGISTICS_FALLBACK: &str = "Unable to generate intelligence report at this time.";

/// Model-backed operations with all gateway errors absorbed.
///
/// Every method returns a usable value. Failures are logged and replaced by the documented
/// fallback; nothing is retried.
#[derive(Clone)]
pub struct AgapayAssistant {
    gateway: Arc<dyn LlmGateway>,
}

impl AgapayAssistant {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// Ask the model for a triage assessment.
    ///
    /// Returns the parsed model output unchanged, or [`ClinicalAssessment::fallback`] when the
    /// credential is missing, the call fails, or the reply is not a valid assessment.
    pub async fn assess_patient_condition(
        &self,
        symptoms: &[String],
        vitals: &Vitals,
        age: u32,
        gender: Gender,
    ) -> ClinicalAssessment {
        match self.try_assess(symptoms, vitals, age, gender).await {
            Ok(assessment) => assessment,
            Err(e) => {
                error!("CDSS service error: {}", e);
                ClinicalAssessment::fallback()
            }
        }
    }

    async fn try_assess(
        &self,
        symptoms: &[String],
        vitals: &Vitals,
        age: u32,
        gender: Gender,
    ) -> GatewayResult<ClinicalAssessment> {
        let request = GatewayRequest::new(
            CDSS_SYSTEM_INSTRUCTION,
            assessment_prompt(symptoms, vitals, age, gender),
        )
        .with_schema(assessment_schema());

        let text = self.gateway.generate(request).await?;
        serde_json::from_str(strip_json_fence(&text)).map_err(GatewayError::ResponseShape)
    }

    /// Relay a companion chat message with the prior transcript as history.
    ///
    /// `history` is the conversation before `message`; `message` is sent once, as the final
    /// user turn.
    pub async fn chat(&self, message: &str, history: &[ChatTurn]) -> String {
        let request = GatewayRequest::new(COMPANION_SYSTEM_INSTRUCTION, message)
            .with_history(history.to_vec());

        match self.gateway.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                error!("Citizen chat error: {}", e);
                CHAT_FALLBACK.to_string()
            }
        }
    }

    /// Produce a Markdown logistics summary from inventory and syndromic trend snapshots.
    pub async fn logistics_intel<I, T>(&self, inventory: &I, trends: &T) -> String
    where
        I: Serialize + ?Sized,
        T: Serialize + ?Sized,
    {
        match self.try_logistics(inventory, trends).await {
            Ok(text) => text,
            Err(e) => {
                error!("Admin analytics error: {}", e);
                LOGISTICS_FALLBACK.to_string()
            }
        }
    }

    async fn try_logistics<I, T>(&self, inventory: &I, trends: &T) -> GatewayResult<String>
    where
        I: Serialize + ?Sized,
        T: Serialize + ?Sized,
    {
        let inventory_json =
            serde_json::to_string(inventory).map_err(GatewayError::PromptEncoding)?;
        let trend_json = serde_json::to_string(trends).map_err(GatewayError::PromptEncoding)?;
        let request = GatewayRequest::new(
            LOGISTICS_SYSTEM_INSTRUCTION,
            logistics_prompt(&inventory_json, &trend_json),
        );
        self.gateway.generate(request).await
    }
}

/// Drop a surrounding Markdown code fence, which some models add even in JSON mode.
fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StubGateway, StubReply, TurnRole};
    use agapay_types::RiskLevel;

    fn febrile_vitals() -> Vitals {
        Vitals {
            temp: 39.5,
            bp_systolic: 90.0,
            bp_diastolic: 60.0,
            pulse: 130.0,
            oxygen: 89.0,
        }
    }

    const RED_ASSESSMENT: &str = r#"{
        "riskLevel": "RED",
        "provisionalClassification": "Pneumonia with hypoxaemia",
        "reasoning": "SpO2 89% with tachycardia.",
        "immediateActions": ["Refer to hospital now"],
        "physicalExamPrompts": [
            {"id": "chest-indrawing", "prompt": "Look for chest indrawing", "expectedFinding": "Lower chest wall goes in on breathing in"}
        ],
        "recommendedMedications": []
    }"#;

    #[tokio::test]
    async fn failing_gateway_yields_exact_fallback() {
        let assistant = AgapayAssistant::new(Arc::new(StubGateway::always_failing()));
        let assessment = assistant
            .assess_patient_condition(
                &["difficulty breathing".into()],
                &febrile_vitals(),
                45,
                Gender::M,
            )
            .await;
        assert_eq!(assessment, ClinicalAssessment::fallback());
    }

    #[tokio::test]
    async fn every_failure_kind_yields_yellow() {
        let failures = [
            StubReply::MissingCredential,
            StubReply::Status(500, "boom".into()),
            StubReply::Text("not json at all".into()),
            StubReply::Text(r#"{"riskLevel": "PURPLE"}"#.into()),
        ];

        for failure in failures {
            let assistant =
                AgapayAssistant::new(Arc::new(StubGateway::new(Vec::new(), failure.clone())));
            let assessment = assistant
                .assess_patient_condition(&["fever".into()], &Vitals::default(), 30, Gender::F)
                .await;
            assert_eq!(assessment.risk_level, RiskLevel::Yellow, "{failure:?}");
            assert!(assessment.physical_exam_prompts.is_empty());
            assert!(assessment.recommended_medications.is_empty());
        }
    }

    #[tokio::test]
    async fn valid_reply_is_returned_unchanged() {
        let stub = Arc::new(StubGateway::replying(RED_ASSESSMENT));
        let assistant = AgapayAssistant::new(stub.clone());

        let assessment = assistant
            .assess_patient_condition(
                &["difficulty breathing".into()],
                &febrile_vitals(),
                45,
                Gender::M,
            )
            .await;

        let expected: ClinicalAssessment = serde_json::from_str(RED_ASSESSMENT).unwrap();
        assert_eq!(assessment, expected);

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].force_json);
        assert!(requests[0].response_schema.is_some());
        assert!(requests[0].history.is_empty());
    }

    #[tokio::test]
    async fn fenced_json_is_accepted() {
        let fenced = format!("```json\n{RED_ASSESSMENT}\n```");
        let assistant = AgapayAssistant::new(Arc::new(StubGateway::replying(fenced)));
        let assessment = assistant
            .assess_patient_condition(&["cough".into()], &Vitals::default(), 60, Gender::M)
            .await;
        assert_eq!(assessment.risk_level, RiskLevel::Red);
    }

    #[tokio::test]
    async fn chat_relays_history_then_message() {
        let stub = Arc::new(StubGateway::replying("Uminom ng maraming tubig."));
        let assistant = AgapayAssistant::new(stub.clone());

        let history = vec![ChatTurn::model("Kamusta!")];
        let reply = assistant.chat("Nilalagnat ako", &history).await;
        assert_eq!(reply, "Uminom ng maraming tubig.");

        let request = &stub.requests()[0];
        assert_eq!(request.user_content, "Nilalagnat ako");
        assert_eq!(request.history.len(), 1);
        assert_eq!(request.history[0].role, TurnRole::Model);
        assert!(!request.force_json);
    }

    #[tokio::test]
    async fn chat_failure_returns_apology() {
        let assistant = AgapayAssistant::new(Arc::new(StubGateway::always_failing()));
        assert_eq!(assistant.chat("hello", &[]).await, CHAT_FALLBACK);
    }

    #[tokio::test]
    async fn logistics_embeds_datasets_and_falls_back() {
        let stub = Arc::new(StubGateway::new(
            vec![StubReply::Text("## Summary".into())],
            StubReply::MissingCredential,
        ));
        let assistant = AgapayAssistant::new(stub.clone());
        let inventory = serde_json::json!([{"name": "San Jose", "stock": 20}]);
        let trends = serde_json::json!([{"day": "Mon", "fever": 12}]);

        assert_eq!(assistant.logistics_intel(&inventory, &trends).await, "## Summary");
        assert_eq!(
            assistant.logistics_intel(&inventory, &trends).await,
            LOGISTICS_FALLBACK
        );

        let request = &stub.requests()[0];
        assert!(request.user_content.contains(r#"[{"name":"San Jose","stock":20}]"#));
        assert!(request.user_content.contains(r#"[{"day":"Mon","fever":12}]"#));
    }

    #[test]
    fn strip_json_fence_handles_plain_and_fenced() {
        assert_eq!(strip_json_fence(" {} "), "{}");
        assert_eq!(strip_json_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_json_fence("```\n{}\n```"), "{}");
    }
}
