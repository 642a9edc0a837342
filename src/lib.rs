//! TriageFlow - Reasoning-first medical triage service
//!
//! This library implements the triage pipeline used by the TriageFlow API.
//! It coerces semi-structured oracle output into a validated clinical
//! assessment, retries once with a corrective prompt, and deterministically
//! escalates to a maximally conservative safety fallback when structured
//! extraction cannot be obtained.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{extract, prompt, TriageEngine};
pub use models::{CandidateAssessment, DispatchNotice, TriageRequest, TriageResponse};
pub use services::{DispatchClient, DispatchSink, GeminiOracle, Oracle, OracleError};
