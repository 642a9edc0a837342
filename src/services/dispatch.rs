use crate::config::DispatchSettings;
use crate::models::DispatchNotice;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Errors that can occur when notifying the MATS dispatch sink
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Dispatch endpoint returned error: {0}")]
    ApiError(String),
}

/// Ambulance notification sink
///
/// Narrow seam mirroring `Oracle`: the engine only ever hands over a notice,
/// so tests can substitute a recording fake for the real MATS client.
#[async_trait]
pub trait DispatchSink: Send + Sync {
    async fn notify(&self, notice: &DispatchNotice) -> Result<(), DispatchError>;
}

/// Client for the Uthishta MATS ambulance tracking system
///
/// Notifications are best-effort: the caller spawns `notify` on a background
/// task and only logs its outcome, so dispatch problems never delay or fail
/// the triage response. When no endpoint is configured the notice is logged
/// instead of posted.
pub struct DispatchClient {
    endpoint: Option<String>,
    client: Client,
}

impl DispatchClient {
    pub fn new(settings: &DispatchSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: settings.endpoint.clone(),
            client,
        }
    }
}

#[async_trait]
impl DispatchSink for DispatchClient {
    /// Send a level-1 dispatch notice to MATS
    async fn notify(&self, notice: &DispatchNotice) -> Result<(), DispatchError> {
        let reasoning_preview: String = notice.clinical_reasoning.chars().take(100).collect();

        error!("INTEGRATION: Triggering Uthishta MATS ambulance tracking protocol");
        error!("Patient urgency: Level {}", notice.urgency_level);
        error!("Timestamp: {}", notice.timestamp);
        error!("Clinical reasoning: {}...", reasoning_preview);

        let endpoint = match &self.endpoint {
            Some(endpoint) => endpoint,
            None => {
                debug!("No MATS endpoint configured, notice {} logged only", notice.notice_id);
                return Ok(());
            }
        };

        let response = self.client.post(endpoint).json(notice).send().await?;

        if !response.status().is_success() {
            return Err(DispatchError::ApiError(format!(
                "Failed to deliver dispatch notice: {}",
                response.status()
            )));
        }

        debug!("Dispatch notice {} delivered", notice.notice_id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_notice() -> DispatchNotice {
        DispatchNotice {
            notice_id: uuid::Uuid::new_v4(),
            urgency_level: 1,
            clinical_reasoning: "Cardiac symptoms".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            symptoms: "Crushing chest pain".to_string(),
        }
    }

    #[tokio::test]
    async fn test_notify_without_endpoint_logs_only() {
        let client = DispatchClient::new(&DispatchSettings {
            endpoint: None,
            timeout_secs: 5,
        });

        assert!(client.notify(&test_notice()).await.is_ok());
    }

    #[tokio::test]
    async fn test_notify_posts_notice_to_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/mats/dispatch")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "urgency_level": 1,
                "clinical_reasoning": "Cardiac symptoms",
                "symptoms": "Crushing chest pain"
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = DispatchClient::new(&DispatchSettings {
            endpoint: Some(format!("{}/mats/dispatch", server.url())),
            timeout_secs: 5,
        });

        assert!(client.notify(&test_notice()).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_notify_maps_error_status_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/mats/dispatch")
            .with_status(503)
            .create_async()
            .await;

        let client = DispatchClient::new(&DispatchSettings {
            endpoint: Some(format!("{}/mats/dispatch", server.url())),
            timeout_secs: 5,
        });

        let result = client.notify(&test_notice()).await;
        assert!(matches!(result, Err(DispatchError::ApiError(_))));
    }

    #[test]
    fn test_notice_serializes_all_fields() {
        let notice = test_notice();
        let json = serde_json::to_value(&notice).unwrap();

        assert_eq!(json["urgency_level"], 1);
        assert_eq!(json["symptoms"], "Crushing chest pain");
        assert!(json["notice_id"].is_string());
    }
}
