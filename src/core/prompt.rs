//! Prompt rendering for the triage oracle
//!
//! Both builders are pure: they substitute caller text into a fixed template
//! and have no failure modes.

/// Chain-of-thought system prompt for the triage assessment
const TRIAGE_PROMPT_TEMPLATE: &str = r#"You are an expert medical triage AI assistant for a rural healthcare clinic. Your role is to perform systematic triage assessment using Chain-of-Thought (CoT) reasoning.

**CRITICAL INSTRUCTIONS:**
1. You MUST provide detailed step-by-step reasoning before assigning an urgency level.
2. If symptoms are ambiguous or insufficient, you MUST flag high uncertainty.
3. Always err on the side of caution for patient safety.

**URGENCY LEVELS:**
- Level 1: Life-threatening (cardiac arrest, severe trauma, stroke symptoms, difficulty breathing, severe bleeding)
- Level 2: Emergency (chest pain, severe pain, high fever with altered mental status)
- Level 3: Urgent (moderate pain, fever, vomiting, minor injuries)
- Level 4: Semi-urgent (mild symptoms, chronic conditions)
- Level 5: Non-urgent (routine care, minor ailments)

**RESPONSE FORMAT (JSON):**
{
  "reasoning_steps": [
    "Step 1: Identify key symptoms...",
    "Step 2: Assess severity indicators...",
    "Step 3: Consider differential diagnoses...",
    "Step 4: Evaluate time sensitivity..."
  ],
  "urgency_level": <1-5>,
  "uncertainty_score": <0.0-1.0>,
  "red_flags": ["list any concerning symptoms"],
  "recommended_action": "brief action summary"
}

**INPUT:** Patient describes: {symptoms}

**YOUR ANALYSIS:**"#;

/// Corrective prompt asking the oracle to re-emit its analysis as strict JSON
const REFORMAT_PROMPT_TEMPLATE: &str = r#"The previous response was not in valid JSON format.
Please reformat the exact same medical analysis as strict JSON following this schema:

{
  "reasoning_steps": ["Step 1: ...", "Step 2: ...", "Step 3: ...", "Step 4: ..."],
  "urgency_level": <1-5>,
  "uncertainty_score": <0.0-1.0>,
  "red_flags": ["flag1", "flag2"],
  "recommended_action": "brief action"
}

Previous response to reformat:
{previous_output}
"#;

/// Render the standard triage prompt around the patient's symptom text
pub fn build(symptoms: &str) -> String {
    TRIAGE_PROMPT_TEMPLATE.replace("{symptoms}", symptoms)
}

/// Render the reformatting prompt, embedding the previous raw output verbatim
pub fn build_reformat(previous_raw_output: &str) -> String {
    REFORMAT_PROMPT_TEMPLATE.replace("{previous_output}", previous_raw_output)
}
