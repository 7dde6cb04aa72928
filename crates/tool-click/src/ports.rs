use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use waymark_core_types::{DriveError, ElementHandle, PageSession};

use crate::gate::{ScriptEvaluationGate, DOM_STATE_PATH};
use crate::model::DomState;

/// Semantic inspection of a control before any click is spent on it.
#[async_trait]
pub trait DomStateInspector: Send + Sync {
    async fn inspect(
        &self,
        session: &dyn PageSession,
        element: &ElementHandle,
    ) -> Result<DomState, DriveError>;
}

const DOM_STATE_SCRIPT: &str = r#"(arg) => {
  const el = arg.element;
  if (!el) return { disabled: false, busy: false };
  const flag = (name) => el.getAttribute(name) === 'true';
  const cls = String(el.className || '');
  return {
    disabled: !!el.disabled || flag('aria-disabled') || /\bdisabled\b/.test(cls),
    busy: flag('aria-busy') || /\b(loading|busy|pending)\b/.test(cls),
  };
}"#;

/// Reads `disabled`/`aria-*` state through the script gate.
pub struct ScriptedDomInspector {
    gate: Arc<ScriptEvaluationGate>,
}

impl ScriptedDomInspector {
    pub fn new(gate: Arc<ScriptEvaluationGate>) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl DomStateInspector for ScriptedDomInspector {
    async fn inspect(
        &self,
        session: &dyn PageSession,
        element: &ElementHandle,
    ) -> Result<DomState, DriveError> {
        let value = self
            .gate
            .evaluate(
                session,
                DOM_STATE_PATH,
                DOM_STATE_SCRIPT,
                json!({ "node_id": element.node_id }),
            )
            .await?;
        if value.is_null() {
            return Ok(DomState::default());
        }
        serde_json::from_value(value)
            .map_err(|err| DriveError::session(format!("unexpected dom state payload: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use waymark_core_types::testing::FakeSession;

    #[tokio::test]
    async fn parses_inspector_payload() {
        let session = FakeSession::new();
        session.configure(|s| {
            s.responder = Some(Arc::new(|_: &str, arg: &Value| {
                assert_eq!(arg["node_id"], "n1");
                Ok(json!({ "disabled": true, "busy": false }))
            }));
        });
        let gate = Arc::new(ScriptEvaluationGate::standard());
        let inspector = ScriptedDomInspector::new(gate.clone());
        let state = inspector
            .inspect(&session, &ElementHandle::new("n1"))
            .await
            .unwrap();
        assert!(state.disabled);
        assert!(!state.busy);
        assert_eq!(gate.audit_count(DOM_STATE_PATH), 1);
    }

    #[tokio::test]
    async fn null_payload_is_neutral() {
        let session = FakeSession::new();
        let inspector = ScriptedDomInspector::new(Arc::new(ScriptEvaluationGate::standard()));
        let state = inspector
            .inspect(&session, &ElementHandle::new("n2"))
            .await
            .unwrap();
        assert_eq!(state, DomState::default());
    }
}
