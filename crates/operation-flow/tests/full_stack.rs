mod support;

use std::sync::Arc;

use confirm_tap::{NetworkTapMonitor, TapConfig};
use operation_flow::{FlowConfig, InteractWorkflow, OperationStateMachine, RunContext, Stage, UrlPageGuard};
use serde_json::json;
use stealth::MotionRng;
use tool_click::{ClickPolicyView, HumanClickPolicy};
use waymark_checkpoint_store::InMemoryCheckpointStore;
use waymark_core_types::testing::{FakeSession, SessionCall};
use waymark_core_types::{FailureKind, NetworkEvent, OperationId, PageId};

use support::{button, locator};

const ENTRY: &str = "https://site.test/explore/note-1";

fn response(url: &str, body: serde_json::Value) -> Vec<NetworkEvent> {
    vec![
        NetworkEvent::RequestWillBeSent {
            request_id: "req-1".into(),
            url: format!("https://site.test{url}"),
            method: "POST".into(),
        },
        NetworkEvent::ResponseReceived {
            request_id: "req-1".into(),
            url: format!("https://site.test{url}"),
            status: 200,
            body,
        },
    ]
}

fn engine(session: Arc<FakeSession>) -> OperationStateMachine {
    let click = HumanClickPolicy::builder(ClickPolicyView::default())
        .with_rng(MotionRng::seeded(3))
        .build()
        .unwrap();
    OperationStateMachine::builder(FlowConfig::default())
        .with_session(session, PageId::new())
        .with_guard(Arc::new(UrlPageGuard::new(ENTRY)))
        .with_locator(locator())
        .with_click_policy(Arc::new(click))
        .with_monitor(Arc::new(NetworkTapMonitor::new(TapConfig::default())))
        .with_workflow(Arc::new(InteractWorkflow::like(
            "/api/note/like",
            "/api/note/dislike",
        )))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn like_is_confirmed_by_the_network() {
    let session = Arc::new(FakeSession::new());
    session.configure(|s| {
        s.roles.push(button("like-btn", "button", "Like"));
        s.action_batches
            .push_back(response("/api/note/like", json!({"success": true})));
    });
    let store = Arc::new(InMemoryCheckpointStore::new(0));

    let outcome = engine(session.clone())
        .run_or_resume(RunContext::new(OperationId::new("like:net:1"), store))
        .await
        .unwrap();
    assert!(outcome.completed, "{:?}", outcome.last_error());
    assert!(outcome.last_checkpoint.succeeded());
    assert_eq!(outcome.last_checkpoint.stage(), Stage::Finalize);
    assert_eq!(
        session.calls().first(),
        Some(&SessionCall::Navigate(ENTRY.into()))
    );
    assert_eq!(
        session.count_calls(|c| matches!(c, SessionCall::ClickElement(id) if id == "like-btn")),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn already_liked_note_reports_the_opposite_signal() {
    let session = Arc::new(FakeSession::new());
    session.configure(|s| {
        s.url = ENTRY.into();
        s.roles.push(button("like-btn", "button", "Like"));
        s.action_batches
            .push_back(response("/api/note/dislike", json!({"code": 0})));
    });
    let store = Arc::new(InMemoryCheckpointStore::new(0));

    let outcome = engine(session)
        .run_or_resume(RunContext::new(OperationId::new("like:net:2"), store))
        .await
        .unwrap();
    assert!(!outcome.completed);
    let err = outcome.last_error().unwrap();
    assert_eq!(err.kind, FailureKind::AmbiguousOppositeSignal);
    assert_eq!(outcome.last_checkpoint.attempt(), 1);
}
