use serde::{Deserialize, Serialize};
use validator::Validate;

/// Structured triage assessment extracted from the oracle's reply
///
/// This is the intermediate record between the raw oracle text and the final
/// response contract. Every field must satisfy the clinical bounds below or
/// the whole record is rejected; only `reasoning_steps` gets a text-based
/// recovery pass before validation (see `core::extract`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateAssessment {
    /// Step-by-step reasoning trace, non-empty after recovery
    #[validate(length(min = 1))]
    pub reasoning_steps: Vec<String>,
    /// 1 = life-threatening, 5 = non-urgent
    #[validate(range(min = 1, max = 5))]
    pub urgency_level: u8,
    /// Model uncertainty, 0.0 (confident) to 1.0 (no confidence)
    #[validate(range(min = 0.0, max = 1.0))]
    pub uncertainty_score: f64,
    /// Concerning symptoms, may be empty
    #[serde(default)]
    pub red_flags: Vec<String>,
    /// Brief action summary
    #[validate(length(min = 1))]
    pub recommended_action: String,
}

/// Payload sent to the MATS ambulance dispatch sink for level-1 urgencies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchNotice {
    pub notice_id: uuid::Uuid,
    pub urgency_level: u8,
    pub clinical_reasoning: String,
    pub timestamp: String,
    pub symptoms: String,
}
