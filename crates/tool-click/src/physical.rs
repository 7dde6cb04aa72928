use serde_json::{json, Value};
use tracing::debug;
use waymark_core_types::{ElementHandle, PageSession};

use crate::gate::{ScriptEvaluationGate, PHYSICAL_ASSESSMENT_PATH};
use crate::model::PhysicalAssessment;

const PHYSICAL_SCRIPT: &str = r#"(arg) => {
  const el = arg.element;
  if (!el) return null;
  const style = window.getComputedStyle(el);
  const rect = el.getBoundingClientRect();
  const cx = rect.left + rect.width / 2;
  const cy = rect.top + rect.height / 2;
  const top = document.elementFromPoint(cx, cy);
  return {
    visible: style.visibility !== 'hidden' && style.display !== 'none' && Number(style.opacity) > 0,
    pointer_events: style.pointerEvents !== 'none',
    unobstructed: !!top && (top === el || el.contains(top)),
  };
}"#;

/// Diagnostic only: failures degrade to unknown signals.
pub(crate) async fn assess(
    session: &dyn PageSession,
    gate: &ScriptEvaluationGate,
    element: &ElementHandle,
) -> PhysicalAssessment {
    let mut assessment = PhysicalAssessment::default();

    let rect = match session.bounding_box(element).await {
        Ok(rect) => rect.or(element.rect),
        Err(err) => {
            debug!(%err, "bounding box unavailable");
            element.rect
        }
    };
    if let (Some(rect), Ok(viewport)) = (rect, session.viewport().await) {
        assessment.in_viewport = Some(!rect.is_empty() && viewport.intersects(&rect));
    }

    match gate
        .evaluate(
            session,
            PHYSICAL_ASSESSMENT_PATH,
            PHYSICAL_SCRIPT,
            json!({ "node_id": element.node_id }),
        )
        .await
    {
        Ok(value) => {
            let flag = |key: &str| value.get(key).and_then(Value::as_bool);
            assessment.visible_by_style = flag("visible");
            assessment.pointer_events = flag("pointer_events");
            assessment.unobstructed = flag("unobstructed");
        }
        Err(err) => debug!(%err, "physical probe failed"),
    }
    assessment
}
