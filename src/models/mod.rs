// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{CandidateAssessment, DispatchNotice};
pub use requests::TriageRequest;
pub use responses::{ErrorResponse, HealthResponse, TriageResponse};
