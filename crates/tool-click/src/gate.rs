//! Whitelist in front of every in-page script evaluation.

use std::collections::HashSet;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, warn};
use waymark_core_types::{DriveError, FailureKind, PageSession};

use crate::metrics;

pub const DOM_STATE_PATH: &str = "dom_state";
pub const PHYSICAL_ASSESSMENT_PATH: &str = "physical_assessment";
pub const SCRIPTED_CLICK_PATH: &str = "scripted_click";

/// Only whitelisted path labels may reach [`PageSession::evaluate`]. Each
/// evaluation that gets through bumps the audit counter for its label.
#[derive(Debug)]
pub struct ScriptEvaluationGate {
    allowed: HashSet<String>,
    audit: DashMap<String, u64>,
}

impl ScriptEvaluationGate {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            audit: DashMap::new(),
        }
    }

    /// The three paths the click policy needs.
    pub fn standard() -> Self {
        Self::new([DOM_STATE_PATH, PHYSICAL_ASSESSMENT_PATH, SCRIPTED_CLICK_PATH])
    }

    pub fn is_allowed(&self, path: &str) -> bool {
        self.allowed.contains(path)
    }

    pub async fn evaluate(
        &self,
        session: &dyn PageSession,
        path: &str,
        script: &str,
        arg: Value,
    ) -> Result<Value, DriveError> {
        if !self.is_allowed(path) {
            warn!(path, "script evaluation denied");
            return Err(DriveError::new(
                FailureKind::EvaluationDenied,
                format!("path '{path}' is not whitelisted"),
            ));
        }
        let value = session.evaluate(script, arg).await?;
        *self.audit.entry(path.to_string()).or_insert(0) += 1;
        metrics::record_injected_script(path);
        debug!(path, "gated script evaluated");
        Ok(value)
    }

    /// Evaluations this gate let through for `path`.
    pub fn audit_count(&self, path: &str) -> u64 {
        self.audit.get(path).map(|count| *count).unwrap_or(0)
    }
}

impl Default for ScriptEvaluationGate {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use waymark_core_types::testing::{FakeSession, SessionCall};

    #[tokio::test]
    async fn non_whitelisted_path_never_reaches_the_page() {
        let session = FakeSession::new();
        let gate = ScriptEvaluationGate::standard();

        let err = gate
            .evaluate(&session, "exfiltrate_cookies", "() => document.cookie", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::EvaluationDenied);
        assert_eq!(
            session.count_calls(|c| matches!(c, SessionCall::Evaluate(_))),
            0
        );
        assert_eq!(gate.audit_count("exfiltrate_cookies"), 0);
        assert_eq!(metrics::injected_script_count("exfiltrate_cookies"), 0);
    }

    #[tokio::test]
    async fn allowed_path_is_audited() {
        let session = FakeSession::new();
        session.configure(|s| {
            s.responder = Some(Arc::new(|_: &str, _: &Value| {
                Ok(json!({ "disabled": false }))
            }));
        });
        let gate = ScriptEvaluationGate::standard();
        let value = gate
            .evaluate(&session, DOM_STATE_PATH, "(arg) => ({})", json!({ "node_id": "1" }))
            .await
            .unwrap();
        assert_eq!(value, json!({ "disabled": false }));
        assert_eq!(gate.audit_count(DOM_STATE_PATH), 1);
        assert_eq!(gate.audit_count(SCRIPTED_CLICK_PATH), 0);
    }

    #[tokio::test]
    async fn failed_evaluation_is_not_audited() {
        let session = FakeSession::new();
        session.configure(|s| {
            s.responder = Some(Arc::new(|_: &str, _: &Value| {
                Err(DriveError::session("target closed"))
            }));
        });
        let gate = ScriptEvaluationGate::standard();
        let err = gate
            .evaluate(&session, PHYSICAL_ASSESSMENT_PATH, "() => 1", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Session);
        assert_eq!(gate.audit_count(PHYSICAL_ASSESSMENT_PATH), 0);
    }
}
