use crate::core::extract::{self, ExtractionError};
use crate::core::prompt;
use crate::models::{CandidateAssessment, DispatchNotice, TriageResponse};
use crate::services::{DispatchSink, Oracle, OracleError};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Internal pipeline failure, absorbed into the safety fallback
///
/// Never escapes `TriageEngine::analyze`.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("response extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Triage orchestrator - drives the prompt/oracle/extraction pipeline
///
/// # Pipeline states
/// 1. ATTEMPT_1: standard prompt, first oracle call, first extraction
/// 2. ATTEMPT_2: reformatting prompt embedding attempt 1's raw output
/// 3. ASSEMBLE: narrative construction and safety-signal derivation
/// 4. FALLBACK: deterministic level-1 escalation when both attempts fail
///
/// `analyze` is total over its input: every failure ends in FALLBACK, never
/// in an error to the caller.
pub struct TriageEngine {
    oracle: Arc<dyn Oracle>,
    dispatch: Arc<dyn DispatchSink>,
}

impl TriageEngine {
    pub fn new(oracle: Arc<dyn Oracle>, dispatch: Arc<dyn DispatchSink>) -> Self {
        Self { oracle, dispatch }
    }

    /// Run the full triage pipeline for one symptom description
    pub async fn analyze(&self, symptoms: &str) -> TriageResponse {
        let preview: String = symptoms.chars().take(100).collect();
        info!("Analyzing symptoms: {}...", preview);

        let response = match self.run_attempts(symptoms).await {
            Ok(assessment) => Self::assemble(&assessment),
            Err(e) => {
                error!("Triage pipeline failed: {}", e);
                error!("SAFETY FALLBACK ACTIVATED - defaulting to Level 1 emergency");
                Self::fallback(symptoms, &e)
            }
        };

        if response.dispatch_ambulance {
            self.spawn_dispatch(&response, symptoms);
        }

        response
    }

    /// ATTEMPT_1 and ATTEMPT_2 of the state machine
    ///
    /// An oracle failure on either attempt short-circuits straight to the
    /// caller's fallback branch via `?`; an extraction failure on attempt 1
    /// triggers the single reformatting retry.
    async fn run_attempts(&self, symptoms: &str) -> Result<CandidateAssessment, TriageError> {
        let raw = self.oracle.generate(&prompt::build(symptoms)).await?;

        match extract::validate(&raw) {
            Ok(assessment) => {
                info!("First extraction attempt succeeded");
                Ok(assessment)
            }
            Err(first_error) => {
                warn!(
                    "Initial extraction failed ({}), retrying with reformatting request",
                    first_error
                );

                let retry_raw = self.oracle.generate(&prompt::build_reformat(&raw)).await?;
                let assessment = extract::validate(&retry_raw)?;

                info!("Retry successful - JSON reformatted correctly");
                Ok(assessment)
            }
        }
    }

    /// ASSEMBLE: build the narrative and derive the safety signals
    fn assemble(assessment: &CandidateAssessment) -> TriageResponse {
        let mut reasoning = String::from("**CHAIN-OF-THOUGHT ANALYSIS:**\n\n");
        for (i, step) in assessment.reasoning_steps.iter().enumerate() {
            reasoning.push_str(&format!("{}. {}\n", i + 1, step));
        }

        let red_flags = if assessment.red_flags.is_empty() {
            "None".to_string()
        } else {
            assessment.red_flags.join(", ")
        };
        reasoning.push_str(&format!("\n**RED FLAGS IDENTIFIED:** {}\n", red_flags));
        reasoning.push_str(&format!(
            "\n**RECOMMENDED ACTION:** {}\n",
            assessment.recommended_action
        ));

        // High uncertainty, critical urgency, or any red flag requires review
        let safety_flag = assessment.uncertainty_score > 0.7
            || assessment.urgency_level <= 2
            || !assessment.red_flags.is_empty();

        TriageResponse {
            urgency_level: assessment.urgency_level,
            clinical_reasoning: reasoning,
            uncertainty_score: assessment.uncertainty_score,
            safety_flag,
            dispatch_ambulance: assessment.urgency_level == 1,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// FALLBACK: maximally conservative response when extraction cannot be
    /// obtained
    fn fallback(symptoms: &str, cause: &TriageError) -> TriageResponse {
        let reasoning = format!(
            "**SYSTEM ERROR - SAFETY FALLBACK ACTIVATED**\n\n\
             The AI triage system encountered an error: {cause}\n\n\
             **SAFETY PROTOCOL:** Due to system limitations, this case has been \
             automatically escalated to Level 1 (Emergency) and requires immediate \
             manual review by qualified medical personnel.\n\n\
             **Original Symptoms:** {symptoms}\n\n\
             **Action Required:** Human clinician assessment MANDATORY."
        );

        TriageResponse {
            urgency_level: 1,
            clinical_reasoning: reasoning,
            uncertainty_score: 1.0,
            safety_flag: true,
            dispatch_ambulance: true,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Fire-and-forget MATS notification; never blocks the response path
    fn spawn_dispatch(&self, response: &TriageResponse, symptoms: &str) {
        let notice = DispatchNotice {
            notice_id: Uuid::new_v4(),
            urgency_level: response.urgency_level,
            clinical_reasoning: response.clinical_reasoning.clone(),
            timestamp: response.timestamp.clone(),
            symptoms: symptoms.to_string(),
        };

        let dispatch = Arc::clone(&self.dispatch);
        tokio::spawn(async move {
            if let Err(e) = dispatch.notify(&notice).await {
                error!("Ambulance dispatch notification failed: {}", e);
            }
        });
    }
}
