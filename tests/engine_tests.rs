// Engine-level property tests for TriageFlow
//
// The oracle is replaced by a scripted fake so every pipeline branch can be
// exercised deterministically.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use triageflow::config::DispatchSettings;
use triageflow::core::TriageEngine;
use triageflow::models::DispatchNotice;
use triageflow::services::{DispatchClient, DispatchError, DispatchSink, Oracle, OracleError};

/// Oracle that replays a scripted sequence and records the prompts it saw
struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn new(replies: Vec<Result<String, OracleError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::EmptyResponse("script exhausted".to_string())))
    }
}

/// Sink that forwards every notice to the test through a channel
struct RecordingSink {
    tx: mpsc::UnboundedSender<DispatchNotice>,
}

impl RecordingSink {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<DispatchNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl DispatchSink for RecordingSink {
    async fn notify(&self, notice: &DispatchNotice) -> Result<(), DispatchError> {
        self.tx.send(notice.clone()).ok();
        Ok(())
    }
}

fn engine(oracle: Arc<ScriptedOracle>) -> TriageEngine {
    let dispatch = Arc::new(DispatchClient::new(&DispatchSettings {
        endpoint: None,
        timeout_secs: 5,
    }));
    TriageEngine::new(oracle, dispatch)
}

fn engine_with_sink(oracle: Arc<ScriptedOracle>, sink: Arc<RecordingSink>) -> TriageEngine {
    TriageEngine::new(oracle, sink)
}

async fn next_notice(rx: &mut mpsc::UnboundedReceiver<DispatchNotice>) -> DispatchNotice {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("dispatch notice was never sent")
        .expect("notice channel closed")
}

fn assessment_json(urgency: u8, uncertainty: f64, red_flags: &[&str]) -> String {
    serde_json::json!({
        "reasoning_steps": ["Identify key symptoms", "Assess severity indicators"],
        "urgency_level": urgency,
        "uncertainty_score": uncertainty,
        "red_flags": red_flags,
        "recommended_action": "Monitor"
    })
    .to_string()
}

#[tokio::test]
async fn test_dispatch_iff_level_one() {
    for urgency in 1..=5u8 {
        let oracle = ScriptedOracle::new(vec![Ok(assessment_json(urgency, 0.1, &[]))]);
        let response = engine(oracle).analyze("Patient reports ongoing symptoms").await;

        assert_eq!(response.urgency_level, urgency);
        assert_eq!(
            response.dispatch_ambulance,
            urgency == 1,
            "dispatch_ambulance must hold exactly for level 1, got level {}",
            urgency
        );
    }
}

#[tokio::test]
async fn test_safety_flag_derivation_matrix() {
    // (urgency, uncertainty, red_flags, expected safety_flag)
    let cases: Vec<(u8, f64, Vec<&str>, bool)> = vec![
        (3, 0.2, vec![], false),
        (3, 0.71, vec![], true),            // uncertainty > 0.7
        (2, 0.1, vec![], true),             // urgency <= 2
        (5, 0.1, vec!["neck stiffness"], true), // red flags present
        (4, 0.7, vec![], false),            // boundary: 0.7 is not > 0.7
    ];

    for (urgency, uncertainty, red_flags, expected) in cases {
        let oracle = ScriptedOracle::new(vec![Ok(assessment_json(
            urgency,
            uncertainty,
            &red_flags,
        ))]);
        let response = engine(oracle).analyze("Patient reports ongoing symptoms").await;

        assert_eq!(
            response.safety_flag, expected,
            "safety_flag mismatch for urgency={}, uncertainty={}, red_flags={:?}",
            urgency, uncertainty, red_flags
        );
    }
}

#[tokio::test]
async fn test_fenced_success_scenario() {
    let raw = r#"```json
{"reasoning_steps":["Step 1: Test","Step 2: Analysis"],"urgency_level":3,"uncertainty_score":0.2,"red_flags":[],"recommended_action":"Monitor"}
```"#;
    let oracle = ScriptedOracle::new(vec![Ok(raw.to_string())]);
    let response = engine(oracle.clone()).analyze("Patient has a headache for 2 days.").await;

    assert_eq!(response.urgency_level, 3);
    assert!(!response.dispatch_ambulance);
    assert!(response.clinical_reasoning.contains("Step 1: Test"));
    assert_eq!(oracle.prompts().len(), 1);
}

#[tokio::test]
async fn test_retry_prompt_embeds_first_reply() {
    let first_reply = "Probably a migraine. 1. Headache for two days 2. No red flags";
    let oracle = ScriptedOracle::new(vec![
        Ok(first_reply.to_string()),
        Ok(assessment_json(4, 0.3, &[])),
    ]);
    let response = engine(oracle.clone()).analyze("Throbbing headache").await;

    assert_eq!(response.urgency_level, 4);

    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Throbbing headache"));
    assert!(
        prompts[1].contains(first_reply),
        "reformatting prompt must embed the previous raw output verbatim"
    );
}

#[tokio::test]
async fn test_fallback_is_deterministic_when_both_attempts_fail() {
    let symptoms = "Severe crushing chest pain radiating to jaw";
    let oracle = ScriptedOracle::new(vec![
        Ok("no structure here".to_string()),
        Ok("and none here either".to_string()),
    ]);
    let response = engine(oracle.clone()).analyze(symptoms).await;

    assert_eq!(response.urgency_level, 1);
    assert_eq!(response.uncertainty_score, 1.0);
    assert!(response.safety_flag);
    assert!(response.dispatch_ambulance);
    assert!(response.clinical_reasoning.contains("SAFETY FALLBACK ACTIVATED"));
    assert!(
        response.clinical_reasoning.contains(symptoms),
        "fallback narrative must embed the original symptom text verbatim"
    );
    assert_eq!(oracle.prompts().len(), 2);
}

#[tokio::test]
async fn test_transport_error_on_first_attempt_skips_retry() {
    let oracle = ScriptedOracle::new(vec![Err(OracleError::ApiError(
        "HTTP 429: rate limited".to_string(),
    ))]);
    let response = engine(oracle.clone()).analyze("Patient fainted twice today").await;

    assert_eq!(response.urgency_level, 1);
    assert!(response.dispatch_ambulance);
    // No reformatting attempt after a transport failure
    assert_eq!(oracle.prompts().len(), 1);
}

#[tokio::test]
async fn test_transport_error_on_retry_falls_back() {
    let oracle = ScriptedOracle::new(vec![
        Ok("unparseable first reply".to_string()),
        Err(OracleError::EmptyResponse("No candidates in Gemini response".to_string())),
    ]);
    let response = engine(oracle).analyze("Persistent dizziness and vomiting").await;

    assert_eq!(response.urgency_level, 1);
    assert_eq!(response.uncertainty_score, 1.0);
    assert!(response.clinical_reasoning.contains("SAFETY FALLBACK ACTIVATED"));
}

#[tokio::test]
async fn test_level_one_result_sends_one_notice_with_case_details() {
    let symptoms = "Patient collapsed and is unresponsive";
    let oracle = ScriptedOracle::new(vec![Ok(assessment_json(1, 0.1, &["unresponsive"]))]);
    let (sink, mut rx) = RecordingSink::new();

    let response = engine_with_sink(oracle, sink).analyze(symptoms).await;
    assert!(response.dispatch_ambulance);

    let notice = next_notice(&mut rx).await;
    assert_eq!(notice.urgency_level, 1);
    assert_eq!(notice.symptoms, symptoms);
    assert_eq!(notice.clinical_reasoning, response.clinical_reasoning);
    assert_eq!(notice.timestamp, response.timestamp);

    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err(), "exactly one notice per case");
}

#[tokio::test]
async fn test_fallback_sends_dispatch_notice() {
    let oracle = ScriptedOracle::new(vec![
        Ok("not structured".to_string()),
        Ok("still not structured".to_string()),
    ]);
    let (sink, mut rx) = RecordingSink::new();

    let response = engine_with_sink(oracle, sink).analyze("Serious condition").await;
    assert!(response.dispatch_ambulance);

    let notice = next_notice(&mut rx).await;
    assert_eq!(notice.urgency_level, 1);
    assert!(notice.clinical_reasoning.contains("SAFETY FALLBACK ACTIVATED"));
    assert_eq!(notice.symptoms, "Serious condition");
}

#[tokio::test]
async fn test_non_emergency_sends_no_notice() {
    let oracle = ScriptedOracle::new(vec![Ok(assessment_json(3, 0.2, &[]))]);
    let (sink, mut rx) = RecordingSink::new();

    let response = engine_with_sink(oracle, sink).analyze("Mild headache since morning").await;
    assert!(!response.dispatch_ambulance);

    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_timestamp_is_iso8601() {
    let oracle = ScriptedOracle::new(vec![Ok(assessment_json(3, 0.2, &[]))]);
    let response = engine(oracle).analyze("Patient has a headache for 2 days.").await;

    assert!(chrono::DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
}
