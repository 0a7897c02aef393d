//! Citizen companion: medication schedule, symptom reports and chat.
//!
//! The three panes are independent. Each holds its own in-memory state and nothing is persisted;
//! a new [`CitizenCompanion`] starts again from the seed fixture.

use crate::constants::{CHAT_GREETING, EMPTY_REPLY_TEXT, REFILL_THRESHOLD};
use crate::{AgapayError, AgapayResult};
use agapay_gateway::{AgapayAssistant, ChatTurn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

const SEED_YAML: &str = include_str!("../fixtures/companion.yaml");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub remaining: u32,
    pub total: u32,
    pub taken_today: bool,
}

impl Medication {
    pub fn needs_refill(&self) -> bool {
        self.remaining < REFILL_THRESHOLD
    }
}

#[derive(Debug, Deserialize)]
struct CompanionSeed {
    citizen: String,
    medications: Vec<Medication>,
}

/// Today's medication schedule.
#[derive(Debug, Clone)]
pub struct MedicationTracker {
    medications: Vec<Medication>,
}

impl MedicationTracker {
    pub fn new(medications: Vec<Medication>) -> Self {
        Self { medications }
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    /// Mark a dose as taken today and decrement the remaining count.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown id
    /// - `InvalidInput` if the dose was already taken today or no tablets remain
    pub fn take(&mut self, id: &str) -> AgapayResult<&Medication> {
        let med = self
            .medications
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AgapayError::NotFound(format!("medication {id}")))?;

        if med.taken_today {
            return Err(AgapayError::InvalidInput(format!(
                "{} already taken today",
                med.name
            )));
        }
        if med.remaining == 0 {
            return Err(AgapayError::InvalidInput(format!("no {} left", med.name)));
        }

        med.taken_today = true;
        med.remaining -= 1;
        Ok(med)
    }
}

/// Symptoms a citizen can report with one tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentinelSymptom {
    Fever,
    Cough,
    #[serde(rename = "Stomach Pain")]
    StomachPain,
    #[serde(rename = "Difficulty Breathing")]
    DifficultyBreathing,
}

impl SentinelSymptom {
    pub const ALL: [SentinelSymptom; 4] = [
        SentinelSymptom::Fever,
        SentinelSymptom::Cough,
        SentinelSymptom::StomachPain,
        SentinelSymptom::DifficultyBreathing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SentinelSymptom::Fever => "Fever",
            SentinelSymptom::Cough => "Cough",
            SentinelSymptom::StomachPain => "Stomach Pain",
            SentinelSymptom::DifficultyBreathing => "Difficulty Breathing",
        }
    }
}

impl fmt::Display for SentinelSymptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SentinelSymptom {
    type Err = AgapayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|symptom| symptom.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AgapayError::InvalidInput(format!("unknown symptom: {s}")))
    }
}

/// Local symptom reports. Nothing is sent over the network.
#[derive(Debug, Clone)]
pub struct SymptomReporter {
    barangay: String,
    reports: Vec<SentinelSymptom>,
}

impl SymptomReporter {
    pub fn new(barangay: impl Into<String>) -> Self {
        Self {
            barangay: barangay.into(),
            reports: Vec::new(),
        }
    }

    /// Record a report and return the acknowledgment shown to the citizen.
    pub fn report(&mut self, symptom: SentinelSymptom) -> String {
        self.reports.push(symptom);
        info!("symptom report: {} ({} this session)", symptom, self.reports.len());
        format!(
            "Report submitted: {}. Thank you for helping Barangay {}!",
            symptom, self.barangay
        )
    }

    pub fn reports(&self) -> &[SentinelSymptom] {
        &self.reports
    }
}

/// A chat message accepted by [`ChatPane::begin_send`], ready for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub message: String,
    /// Transcript before `message`.
    pub history: Vec<ChatTurn>,
}

/// Ordered chat transcript. Only one message may be outstanding at a time.
#[derive(Debug, Clone)]
pub struct ChatPane {
    transcript: Vec<ChatTurn>,
    pending: bool,
}

impl Default for ChatPane {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatPane {
    pub fn new() -> Self {
        Self {
            transcript: vec![ChatTurn::model(CHAT_GREETING)],
            pending: false,
        }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn can_send(&self, input: &str) -> bool {
        !self.pending && !input.trim().is_empty()
    }

    /// Append the user's turn and block further sends.
    pub fn begin_send(&mut self, input: &str) -> AgapayResult<PendingMessage> {
        if self.pending {
            return Err(AgapayError::Busy("chat reply"));
        }
        if input.trim().is_empty() {
            return Err(AgapayError::InvalidInput("message cannot be empty".into()));
        }

        let history = self.transcript.clone();
        self.transcript.push(ChatTurn::user(input));
        self.pending = true;
        Ok(PendingMessage {
            message: input.to_string(),
            history,
        })
    }

    /// Append the model's turn and unblock. An empty reply is replaced by a retry prompt.
    pub fn complete_send(&mut self, reply: String) -> AgapayResult<&ChatTurn> {
        if !self.pending {
            return Err(AgapayError::InvalidTransition {
                action: "complete a chat reply",
                step: "idle",
            });
        }

        let text = if reply.trim().is_empty() {
            EMPTY_REPLY_TEXT.to_string()
        } else {
            reply
        };
        self.transcript.push(ChatTurn::model(text));
        self.pending = false;
        self.transcript
            .last()
            .ok_or(AgapayError::InvalidTransition {
                action: "read the chat reply",
                step: "idle",
            })
    }

    pub async fn send(
        &mut self,
        assistant: &AgapayAssistant,
        input: &str,
    ) -> AgapayResult<&ChatTurn> {
        let pending = self.begin_send(input)?;
        let reply = assistant.chat(&pending.message, &pending.history).await;
        self.complete_send(reply)
    }
}

/// All three companion panes for one citizen.
#[derive(Debug, Clone)]
pub struct CitizenCompanion {
    citizen: String,
    pub medications: MedicationTracker,
    pub reports: SymptomReporter,
    pub chat: ChatPane,
}

impl CitizenCompanion {
    /// A companion seeded from the bundled fixture.
    ///
    /// # Errors
    ///
    /// Returns `AgapayError::YamlDeserialization` if the fixture is malformed.
    pub fn seeded(barangay: &str) -> AgapayResult<Self> {
        let seed: CompanionSeed =
            serde_yaml::from_str(SEED_YAML).map_err(AgapayError::YamlDeserialization)?;
        Ok(Self {
            citizen: seed.citizen,
            medications: MedicationTracker::new(seed.medications),
            reports: SymptomReporter::new(barangay),
            chat: ChatPane::new(),
        })
    }

    pub fn citizen(&self) -> &str {
        &self.citizen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agapay_gateway::{StubGateway, StubReply, TurnRole, CHAT_FALLBACK};
    use std::sync::Arc;

    fn companion() -> CitizenCompanion {
        CitizenCompanion::seeded("San Jose").expect("fixture should parse")
    }

    #[test]
    fn seed_matches_schedule() {
        let companion = companion();
        assert_eq!(companion.citizen(), "Maria Clara");

        let meds = companion.medications.medications();
        assert_eq!(meds.len(), 2);
        assert_eq!(meds[0].name, "Losartan");
        assert_eq!((meds[0].remaining, meds[0].total), (8, 30));
        assert!(!meds[0].taken_today);
        assert!(meds[0].needs_refill());
        assert!(meds[1].taken_today);
        assert!(!meds[1].needs_refill());
    }

    #[test]
    fn taking_a_dose_decrements_once() {
        let mut companion = companion();
        let med = companion.medications.take("1").expect("take should succeed");
        assert_eq!(med.remaining, 7);
        assert!(med.taken_today);

        assert!(matches!(
            companion.medications.take("1"),
            Err(AgapayError::InvalidInput(_))
        ));
        assert!(matches!(
            companion.medications.take("2"),
            Err(AgapayError::InvalidInput(_))
        ));
        assert!(matches!(
            companion.medications.take("9"),
            Err(AgapayError::NotFound(_))
        ));
        assert_eq!(companion.medications.medications()[0].remaining, 7);
    }

    #[test]
    fn report_acknowledges_with_barangay() {
        let mut reporter = SymptomReporter::new("San Jose");
        let symptom: SentinelSymptom = "stomach pain".parse().expect("should parse");
        assert_eq!(
            reporter.report(symptom),
            "Report submitted: Stomach Pain. Thank you for helping Barangay San Jose!"
        );
        assert_eq!(reporter.reports(), &[SentinelSymptom::StomachPain]);
        assert!("headache".parse::<SentinelSymptom>().is_err());
    }

    #[test]
    fn chat_blocks_while_pending() {
        let mut chat = ChatPane::new();
        assert!(!chat.can_send("  "));
        assert!(chat.can_send("Masakit ang ulo ko"));

        let pending = chat.begin_send("Masakit ang ulo ko").unwrap();
        assert_eq!(pending.history, vec![ChatTurn::model(CHAT_GREETING)]);
        assert!(!chat.can_send("isa pa"));
        assert!(matches!(chat.begin_send("isa pa"), Err(AgapayError::Busy(_))));

        let reply = chat.complete_send(String::new()).unwrap();
        assert_eq!(reply.text, EMPTY_REPLY_TEXT);
        assert!(chat.can_send("isa pa"));
    }

    #[tokio::test]
    async fn chat_transcript_keeps_send_order() {
        let stub = Arc::new(StubGateway::new(
            vec![
                StubReply::Text("Uminom ng tubig.".into()),
                StubReply::Text("Magpahinga po kayo.".into()),
            ],
            StubReply::MissingCredential,
        ));
        let assistant = AgapayAssistant::new(stub.clone());
        let mut chat = ChatPane::new();

        chat.send(&assistant, "A").await.unwrap();
        chat.send(&assistant, "B").await.unwrap();

        let turns: Vec<(TurnRole, &str)> = chat.transcript()[1..]
            .iter()
            .map(|t| (t.role, t.text.as_str()))
            .collect();
        assert_eq!(
            turns,
            vec![
                (TurnRole::User, "A"),
                (TurnRole::Model, "Uminom ng tubig."),
                (TurnRole::User, "B"),
                (TurnRole::Model, "Magpahinga po kayo."),
            ]
        );

        let requests = stub.requests();
        assert_eq!(requests[1].user_content, "B");
        assert_eq!(requests[1].history.len(), 3);
    }

    #[tokio::test]
    async fn chat_failure_shows_apology() {
        let assistant = AgapayAssistant::new(Arc::new(StubGateway::always_failing()));
        let mut chat = ChatPane::new();
        let reply = chat.send(&assistant, "Tulong").await.unwrap();
        assert_eq!(reply.text, CHAT_FALLBACK);
        assert!(!chat.is_pending());
    }
}
