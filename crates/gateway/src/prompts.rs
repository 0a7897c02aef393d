//! System instructions and prompt builders for the three model calls.

use agapay_types::{Gender, Vitals};

pub(crate) const CDSS_SYSTEM_INSTRUCTION: &str = r#"
You are an expert Medical Officer acting as a Clinical Decision Support System (CDSS) for Barangay Health Workers (BHWs) in the Philippines.
BHWs are volunteers with limited training. Your goal is to:
1. Analyze symptoms and vitals.
2. Direct the BHW to perform specific, simple physical exam checks to rule out dangerous conditions (e.g., Appendicitis, Dengue, Pneumonia).
3. Triage the patient into GREEN (Home Care), YELLOW (Teleconsult/Clinic), or RED (Emergency Referral).
4. Provide immediate actionable advice based on DOH Clinical Practice Guidelines.

IMPORTANT: You must return the response in strict JSON format matching this schema:
{
  "riskLevel": "GREEN" | "YELLOW" | "RED",
  "provisionalClassification": "string",
  "reasoning": "string",
  "immediateActions": ["string", "string"],
  "physicalExamPrompts": [
    {
      "id": "string",
      "prompt": "Instructions for the BHW, e.g. 'Check capillary refill time'",
      "expectedFinding": "What creates a positive finding, e.g. '> 2 seconds'"
    }
  ],
  "recommendedMedications": ["string"]
}
"#;

pub(crate) const COMPANION_SYSTEM_INSTRUCTION: &str = r#"You are "Agapay", a friendly health assistant for Filipino citizens.
- Speak in "Taglish" (Tagalog-English mix) to be relatable and clear.
- You are NOT a doctor. Do not diagnose.
- If symptoms sound mild (Green risk), give home remedies (hydration, rest, herbal tea).
- If symptoms sound serious (chest pain, difficulty breathing, high fever > 3 days), URGENTLY tell them to go to the Barangay Health Center or Hospital.
- Keep answers short (under 50 words)."#;

pub(crate) const LOGISTICS_SYSTEM_INSTRUCTION: &str =
    "You are an expert Public Health Logistics Officer using predictive analytics to prevent shortages.";

pub(crate) fn assessment_prompt(
    symptoms: &[String],
    vitals: &Vitals,
    age: u32,
    gender: Gender,
) -> String {
    format!(
        "Patient Profile:\n\
         - Age: {age}\n\
         - Gender: {gender}\n\
         - Symptoms: {symptoms}\n\
         - Vitals: {vitals}\n\n\
         Provide a clinical assessment, risk classification, and specific physical exam prompts \
         the BHW should check right now.\n\
         Return JSON only.",
        symptoms = symptoms.join(", "),
    )
}

pub(crate) fn logistics_prompt(inventory_json: &str, trend_json: &str) -> String {
    format!(
        "Analyze this Local Government Unit (LGU) health data:\n\n\
         INVENTORY STATUS:\n{inventory_json}\n\n\
         SYNDROMIC TRENDS (Last 5 days):\n{trend_json}\n\n\
         Task:\n\
         1. Identify correlations between rising cases and stock levels.\n\
         2. Predict immediate stockouts.\n\
         3. Recommend specific logistics movements (e.g., \"Transfer 500 units of Paracetamol \
         from Barangay X to Barangay Y\").\n\
         4. Format the output as a clean Markdown Executive Summary."
    )
}

/// JSON schema declared to providers that support schema-constrained output.
///
/// Mirrors the wire shape of [`agapay_types::ClinicalAssessment`]; client-side exam fields are
/// deliberately absent.
pub fn assessment_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "riskLevel",
            "provisionalClassification",
            "reasoning",
            "immediateActions",
            "physicalExamPrompts",
            "recommendedMedications"
        ],
        "properties": {
            "riskLevel": { "type": "string", "enum": ["GREEN", "YELLOW", "RED"] },
            "provisionalClassification": { "type": "string" },
            "reasoning": { "type": "string" },
            "immediateActions": { "type": "array", "items": { "type": "string" } },
            "physicalExamPrompts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["id", "prompt", "expectedFinding"],
                    "properties": {
                        "id": { "type": "string" },
                        "prompt": { "type": "string" },
                        "expectedFinding": { "type": "string" }
                    }
                }
            },
            "recommendedMedications": { "type": "array", "items": { "type": "string" } }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assessment_prompt_lists_profile() {
        let vitals = Vitals {
            temp: 39.5,
            bp_systolic: 90.0,
            bp_diastolic: 60.0,
            pulse: 130.0,
            oxygen: 89.0,
        };
        let prompt = assessment_prompt(
            &["fever".into(), "difficulty breathing".into()],
            &vitals,
            8,
            Gender::F,
        );
        assert!(prompt.contains("- Age: 8"));
        assert!(prompt.contains("- Gender: F"));
        assert!(prompt.contains("- Symptoms: fever, difficulty breathing"));
        assert!(prompt.contains("Temp 39.5C, BP 90/60, HR 130, SpO2 89%"));
    }

    #[test]
    fn schema_requires_every_assessment_field() {
        let schema = assessment_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 6);
    }
}
