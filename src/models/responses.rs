use serde::{Deserialize, Serialize};

/// Final triage response contract
///
/// Invariant: `dispatch_ambulance` is true if and only if `urgency_level`
/// is 1. Fallback responses are always level 1 with full uncertainty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResponse {
    /// 1 = life-threatening, 5 = non-urgent
    pub urgency_level: u8,
    /// Detailed chain-of-thought reasoning trace
    pub clinical_reasoning: String,
    /// Model uncertainty, 0.0 to 1.0
    pub uncertainty_score: f64,
    /// True if high uncertainty or ambiguous symptoms - requires manual review
    pub safety_flag: bool,
    /// True if immediate ambulance dispatch is needed
    pub dispatch_ambulance: bool,
    /// ISO-8601 generation time
    pub timestamp: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub oracle_configured: bool,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
