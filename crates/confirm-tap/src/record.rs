use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Endpoint-agnostic view of one observed response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitoredRecord {
    pub endpoint: String,
    pub request_id: String,
    pub url: String,
    /// HTTP status; 0 when the request failed before a response.
    pub status: u16,
    pub ok: bool,
    pub latency_ms: Option<u64>,
    pub body: Value,
    pub received_at: DateTime<Utc>,
}

impl MonitoredRecord {
    pub fn from_response(
        endpoint: &str,
        request_id: &str,
        url: &str,
        status: u16,
        body: Value,
        latency_ms: Option<u64>,
    ) -> Self {
        let ok = (200..300).contains(&status) && !carries_failure_marker(&body);
        Self {
            endpoint: endpoint.to_string(),
            request_id: request_id.to_string(),
            url: url.to_string(),
            status,
            ok,
            latency_ms,
            body,
            received_at: Utc::now(),
        }
    }

    pub fn failed(endpoint: &str, request_id: &str, url: &str, latency_ms: Option<u64>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            request_id: request_id.to_string(),
            url: url.to_string(),
            status: 0,
            ok: false,
            latency_ms,
            body: Value::Null,
            received_at: Utc::now(),
        }
    }
}

/// Application-level failure inside a 2xx body: `success: false`, or a
/// non-zero `code` / `status_code`.
pub fn carries_failure_marker(body: &Value) -> bool {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return true;
    }
    ["code", "status_code"].iter().any(|key| match body.get(*key) {
        Some(Value::Number(n)) => n.as_i64() != Some(0),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        _ => false,
    })
}
