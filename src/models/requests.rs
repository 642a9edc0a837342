use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Request to perform a triage assessment
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TriageRequest {
    /// Patient symptom description, at least 5 characters after trimming
    #[validate(custom(function = "validate_description"))]
    pub text_description: String,
    /// Optional image URL, reserved for a future visual-triage path
    #[serde(default)]
    pub image_url: Option<String>,
}

fn validate_description(value: &str) -> Result<(), ValidationError> {
    if value.trim().len() < 5 {
        return Err(ValidationError::new("symptom_description_too_short"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_description_rejected() {
        let request = TriageRequest {
            text_description: "bad".to_string(),
            image_url: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_whitespace_padding_does_not_count() {
        let request = TriageRequest {
            text_description: "  bad   ".to_string(),
            image_url: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_valid_description_accepted() {
        let request = TriageRequest {
            text_description: "Patient has a headache for 2 days.".to_string(),
            image_url: None,
        };
        assert!(request.validate().is_ok());
    }
}
