// Core pipeline exports
pub mod engine;
pub mod extract;
pub mod prompt;

pub use engine::{TriageEngine, TriageError};
pub use extract::{extract_numbered_steps, validate, ExtractionError};
pub use prompt::{build, build_reformat};
