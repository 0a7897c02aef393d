//! Constants used throughout the Agapay core crate.

/// Default directory for local device storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "agapay_data";

/// Directory under the data directory holding one file per key-value entry.
pub const STORE_DIR_NAME: &str = "kv";

/// Barangay assigned to records when none is configured.
pub const DEFAULT_BARANGAY: &str = "San Jose";

/// Prefix of the storage key for a patient's history.
pub const PATIENT_KEY_PREFIX: &str = "agapay_patient_";

/// Medications below this many remaining tablets are flagged for refill.
pub const REFILL_THRESHOLD: u32 = 10;

/// First turn of every companion chat transcript.
pub const CHAT_GREETING: &str = "Kamusta! Ako si Agapay. Anong nararamdaman mo ngayon?";

/// Shown in place of an empty model reply.
pub const EMPTY_REPLY_TEXT: &str = "Sorry, try again.";
