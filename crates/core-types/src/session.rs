//! Browser session contract.
//!
//! Process provisioning, navigation and raw input are owned by whichever
//! driver backs a [`PageSession`]; the engine only consumes this surface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::{DriveError, Point, Rect};

/// Concrete on-page control returned by element queries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-specific node reference.
    pub node_id: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Accessible name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub rect: Option<Rect>,
}

impl ElementHandle {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>, name: Option<&str>) -> Self {
        self.role = Some(role.into());
        self.name = name.map(str::to_string);
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Text used for fuzzy matching: accessible name first, then inner text.
    pub fn label(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.text.as_deref())
    }
}

/// Network traffic observed on a page, as reported by the session driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkEvent {
    RequestWillBeSent {
        request_id: String,
        url: String,
        method: String,
    },
    ResponseReceived {
        request_id: String,
        url: String,
        status: u16,
        #[serde(default)]
        body: Value,
    },
    LoadingFailed {
        request_id: String,
    },
}

impl NetworkEvent {
    pub fn request_id(&self) -> &str {
        match self {
            NetworkEvent::RequestWillBeSent { request_id, .. }
            | NetworkEvent::ResponseReceived { request_id, .. }
            | NetworkEvent::LoadingFailed { request_id } => request_id,
        }
    }
}

/// One driven page. Exactly one workflow owns a session at a time.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn current_url(&self) -> Result<String, DriveError>;
    async fn navigate(&self, url: &str) -> Result<(), DriveError>;

    async fn query_selector_all(&self, css: &str) -> Result<Vec<ElementHandle>, DriveError>;
    async fn query_by_role(
        &self,
        role: &str,
        name: Option<&str>,
    ) -> Result<Vec<ElementHandle>, DriveError>;
    /// Every interactive element currently attached to the document.
    async fn interactive_elements(&self) -> Result<Vec<ElementHandle>, DriveError>;
    async fn bounding_box(&self, element: &ElementHandle) -> Result<Option<Rect>, DriveError>;
    async fn viewport(&self) -> Result<Rect, DriveError>;

    async fn hover(&self, element: &ElementHandle) -> Result<(), DriveError>;
    async fn click_element(&self, element: &ElementHandle) -> Result<(), DriveError>;
    async fn mouse_move(&self, to: Point) -> Result<(), DriveError>;
    async fn mouse_click(&self, at: Point) -> Result<(), DriveError>;
    async fn wheel(&self, delta_x: f64, delta_y: f64) -> Result<(), DriveError>;
    async fn type_text(&self, text: &str) -> Result<(), DriveError>;
    async fn press_key(&self, key: &str) -> Result<(), DriveError>;

    /// Evaluate a function expression in the page, called with `arg`. The
    /// driver resolves `arg.node_id` to the live node as `arg.element`.
    /// Callers go through the script gate rather than calling this directly.
    async fn evaluate(&self, script: &str, arg: Value) -> Result<Value, DriveError>;

    fn subscribe_network(&self) -> broadcast::Receiver<NetworkEvent>;
}
