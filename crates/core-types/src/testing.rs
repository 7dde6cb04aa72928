//! In-memory [`PageSession`] double shared by the crate test suites.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::session::{ElementHandle, NetworkEvent, PageSession};
use crate::{DriveError, Point, Rect};

/// Calls observed by [`FakeSession`], in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionCall {
    Navigate(String),
    Hover(String),
    ClickElement(String),
    MouseMove(Point),
    MouseClick(Point),
    Wheel(f64),
    TypeText(String),
    PressKey(String),
    Evaluate(String),
}

pub type EvalResponder = Arc<dyn Fn(&str, &Value) -> Result<Value, DriveError> + Send + Sync>;

pub struct FakeState {
    pub url: String,
    /// URL adopted on the next `navigate`, defaults to the requested one.
    pub navigate_lands_on: Option<String>,
    pub selectors: HashMap<String, Vec<ElementHandle>>,
    pub roles: Vec<ElementHandle>,
    pub interactive: Vec<ElementHandle>,
    /// Elements that only appear after this many wheel events.
    pub revealed_after_scrolls: Option<(u32, Vec<ElementHandle>)>,
    pub viewport: Rect,
    pub fail_click_element: bool,
    pub fail_mouse_click: bool,
    pub responder: Option<EvalResponder>,
    /// One batch of network events is broadcast per click, key press or wheel.
    pub action_batches: VecDeque<Vec<NetworkEvent>>,
    pub wheel_count: u32,
    pub calls: Vec<SessionCall>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            url: "about:blank".into(),
            navigate_lands_on: None,
            selectors: HashMap::new(),
            roles: Vec::new(),
            interactive: Vec::new(),
            revealed_after_scrolls: None,
            viewport: Rect::new(0.0, 0.0, 1280.0, 800.0),
            fail_click_element: false,
            fail_mouse_click: false,
            responder: None,
            action_batches: VecDeque::new(),
            wheel_count: 0,
            calls: Vec::new(),
        }
    }
}

pub struct FakeSession {
    state: Mutex<FakeState>,
    network: broadcast::Sender<NetworkEvent>,
}

impl Default for FakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSession {
    pub fn new() -> Self {
        let (network, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(FakeState::default()),
            network,
        }
    }

    pub fn configure(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock());
    }

    pub fn calls(&self) -> Vec<SessionCall> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&SessionCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Broadcast an event as if the page had produced it.
    pub fn emit(&self, event: NetworkEvent) {
        let _ = self.network.send(event);
    }

    fn record(&self, call: SessionCall) {
        self.state.lock().calls.push(call);
    }

    fn flush_action_batch(&self) {
        let batch = self.state.lock().action_batches.pop_front();
        for event in batch.unwrap_or_default() {
            self.emit(event);
        }
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn current_url(&self) -> Result<String, DriveError> {
        Ok(self.state.lock().url.clone())
    }

    async fn navigate(&self, url: &str) -> Result<(), DriveError> {
        let mut state = self.state.lock();
        state.calls.push(SessionCall::Navigate(url.to_string()));
        state.url = state
            .navigate_lands_on
            .clone()
            .unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn query_selector_all(&self, css: &str) -> Result<Vec<ElementHandle>, DriveError> {
        Ok(self
            .state
            .lock()
            .selectors
            .get(css)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_by_role(
        &self,
        role: &str,
        name: Option<&str>,
    ) -> Result<Vec<ElementHandle>, DriveError> {
        let state = self.state.lock();
        Ok(state
            .roles
            .iter()
            .filter(|el| el.role.as_deref() == Some(role))
            .filter(|el| name.map_or(true, |n| el.name.as_deref() == Some(n)))
            .cloned()
            .collect())
    }

    async fn interactive_elements(&self) -> Result<Vec<ElementHandle>, DriveError> {
        let state = self.state.lock();
        let mut all = state.interactive.clone();
        if let Some((after, revealed)) = &state.revealed_after_scrolls {
            if state.wheel_count >= *after {
                all.extend(revealed.iter().cloned());
            }
        }
        Ok(all)
    }

    async fn bounding_box(&self, element: &ElementHandle) -> Result<Option<Rect>, DriveError> {
        Ok(element.rect)
    }

    async fn viewport(&self) -> Result<Rect, DriveError> {
        Ok(self.state.lock().viewport)
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), DriveError> {
        self.record(SessionCall::Hover(element.node_id.clone()));
        Ok(())
    }

    async fn click_element(&self, element: &ElementHandle) -> Result<(), DriveError> {
        self.record(SessionCall::ClickElement(element.node_id.clone()));
        if self.state.lock().fail_click_element {
            return Err(DriveError::session("element click intercepted"));
        }
        self.flush_action_batch();
        Ok(())
    }

    async fn mouse_move(&self, to: Point) -> Result<(), DriveError> {
        self.record(SessionCall::MouseMove(to));
        Ok(())
    }

    async fn mouse_click(&self, at: Point) -> Result<(), DriveError> {
        self.record(SessionCall::MouseClick(at));
        if self.state.lock().fail_mouse_click {
            return Err(DriveError::session("coordinate click failed"));
        }
        self.flush_action_batch();
        Ok(())
    }

    async fn wheel(&self, _delta_x: f64, delta_y: f64) -> Result<(), DriveError> {
        {
            let mut state = self.state.lock();
            state.calls.push(SessionCall::Wheel(delta_y));
            state.wheel_count += 1;
        }
        self.flush_action_batch();
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), DriveError> {
        self.record(SessionCall::TypeText(text.to_string()));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), DriveError> {
        self.record(SessionCall::PressKey(key.to_string()));
        self.flush_action_batch();
        Ok(())
    }

    async fn evaluate(&self, script: &str, arg: Value) -> Result<Value, DriveError> {
        self.record(SessionCall::Evaluate(script.to_string()));
        let responder = self.state.lock().responder.clone();
        match responder {
            Some(responder) => responder(script, &arg),
            None => Ok(Value::Null),
        }
    }

    fn subscribe_network(&self) -> broadcast::Receiver<NetworkEvent> {
        self.network.subscribe()
    }
}
