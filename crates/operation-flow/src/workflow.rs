//! Workflow flavors: what to locate, how to act and how to confirm.

use action_locator::LocatorHint;
use confirm_tap::{EndpointRule, EndpointSet, MonitoredRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checkpoint::StageCheckpoint;

/// Interaction performed in the Act stage.
#[derive(Clone, Debug, PartialEq)]
pub enum ActStep {
    /// Click the located element.
    Click { label: String },
    /// Click the located field, type `text`, then press Enter.
    TypeAndSubmit { label: String, text: String },
    /// Wheel-scroll the page; needs no element.
    Scroll { dy: f64 },
}

/// How the AwaitConfirmation stage decides the action took effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// At least `min_count` successful responses on `endpoint`.
    Responses { endpoint: String, min_count: usize },
    /// Toggle-style: `endpoint` must respond, and its opposite responding
    /// instead is reported separately.
    Toggle { endpoint: String },
}

/// A fixed workflow shape driven by the engine.
pub trait Workflow: Send + Sync {
    /// Coarse label for logs and metric labels.
    fn label(&self) -> &str;

    fn target_max(&self) -> u32;

    fn endpoints(&self) -> EndpointSet;

    /// Element to resolve before acting, if any.
    fn locate(&self, checkpoint: &StageCheckpoint) -> Option<LocatorHint>;

    fn act(&self, checkpoint: &StageCheckpoint) -> ActStep;

    fn confirmation(&self) -> Confirmation;

    /// Natural ids of the items carried by this round's records.
    fn harvest(&self, _records: &[MonitoredRecord]) -> Vec<String> {
        Vec::new()
    }

    /// Cursor to persist once a round has been aggregated.
    fn next_cursor(&self, checkpoint: &StageCheckpoint) -> Option<String> {
        checkpoint.cursor().map(str::to_string)
    }

    /// Check a confirmed toggle. The default wants one successful record.
    fn verify(&self, records: &[MonitoredRecord]) -> Result<(), String> {
        if records.iter().any(|record| record.ok) {
            Ok(())
        } else {
            Err("confirmation carried no successful record".into())
        }
    }
}

/// Pulls item ids out of response bodies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemExtractor {
    /// JSON pointer to the item array, e.g. `/data/items`.
    pub items_pointer: String,
    /// Field holding each item's natural id.
    pub id_field: String,
}

impl ItemExtractor {
    pub fn new(items_pointer: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            items_pointer: items_pointer.into(),
            id_field: id_field.into(),
        }
    }

    pub fn extract(&self, body: &Value) -> Vec<String> {
        let Some(items) = body.pointer(&self.items_pointer).and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item.get(&self.id_field)? {
                Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Ids across every successful record, in arrival order.
    pub fn extract_all(&self, records: &[MonitoredRecord]) -> Vec<String> {
        records
            .iter()
            .filter(|record| record.ok)
            .flat_map(|record| self.extract(&record.body))
            .collect()
    }
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self::new("/data/items", "id")
    }
}

fn page_number(cursor: Option<&str>) -> u32 {
    cursor
        .and_then(|c| c.strip_prefix("page:"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// Submit a query, then page through results until `target_max` items.
#[derive(Clone, Debug)]
pub struct SearchWorkflow {
    query: String,
    target_max: u32,
    search_box: LocatorHint,
    next_page: LocatorHint,
    endpoint: EndpointRule,
    extractor: ItemExtractor,
}

impl SearchWorkflow {
    pub const ENDPOINT: &'static str = "search";

    pub fn new(query: impl Into<String>, target_max: u32, results_url: &str) -> Self {
        Self {
            query: query.into(),
            target_max,
            search_box: LocatorHint::new()
                .alias("search_input")
                .role("searchbox"),
            next_page: LocatorHint::new()
                .alias("next_page")
                .role("button")
                .text("Next"),
            endpoint: EndpointRule::new(Self::ENDPOINT, results_url),
            extractor: ItemExtractor::default(),
        }
    }

    pub fn with_search_box(mut self, hint: LocatorHint) -> Self {
        self.search_box = hint;
        self
    }

    pub fn with_next_page(mut self, hint: LocatorHint) -> Self {
        self.next_page = hint;
        self
    }

    pub fn with_extractor(mut self, extractor: ItemExtractor) -> Self {
        self.extractor = extractor;
        self
    }
}

impl Workflow for SearchWorkflow {
    fn label(&self) -> &str {
        "search"
    }

    fn target_max(&self) -> u32 {
        self.target_max
    }

    fn endpoints(&self) -> EndpointSet {
        EndpointSet::new().with(self.endpoint.clone())
    }

    fn locate(&self, checkpoint: &StageCheckpoint) -> Option<LocatorHint> {
        match checkpoint.cursor() {
            None => Some(self.search_box.clone()),
            Some(_) => Some(self.next_page.clone()),
        }
    }

    fn act(&self, checkpoint: &StageCheckpoint) -> ActStep {
        match checkpoint.cursor() {
            None => ActStep::TypeAndSubmit {
                label: "search_input".into(),
                text: self.query.clone(),
            },
            Some(_) => ActStep::Click {
                label: "next_page".into(),
            },
        }
    }

    fn confirmation(&self) -> Confirmation {
        Confirmation::Responses {
            endpoint: Self::ENDPOINT.into(),
            min_count: 1,
        }
    }

    fn harvest(&self, records: &[MonitoredRecord]) -> Vec<String> {
        self.extractor.extract_all(records)
    }

    fn next_cursor(&self, checkpoint: &StageCheckpoint) -> Option<String> {
        Some(format!("page:{}", page_number(checkpoint.cursor()) + 1))
    }
}

/// Scroll a feed and collect the items its lazy-load responses carry.
#[derive(Clone, Debug)]
pub struct ScrollAggregateWorkflow {
    target_max: u32,
    scroll_px: f64,
    endpoint: EndpointRule,
    extractor: ItemExtractor,
}

impl ScrollAggregateWorkflow {
    pub const ENDPOINT: &'static str = "feed";

    pub fn new(target_max: u32, feed_url: &str) -> Self {
        Self {
            target_max,
            scroll_px: 900.0,
            endpoint: EndpointRule::new(Self::ENDPOINT, feed_url),
            extractor: ItemExtractor::default(),
        }
    }

    pub fn with_scroll_px(mut self, scroll_px: f64) -> Self {
        self.scroll_px = scroll_px;
        self
    }

    pub fn with_extractor(mut self, extractor: ItemExtractor) -> Self {
        self.extractor = extractor;
        self
    }
}

impl Workflow for ScrollAggregateWorkflow {
    fn label(&self) -> &str {
        "scroll_aggregate"
    }

    fn target_max(&self) -> u32 {
        self.target_max
    }

    fn endpoints(&self) -> EndpointSet {
        EndpointSet::new().with(self.endpoint.clone())
    }

    fn locate(&self, _checkpoint: &StageCheckpoint) -> Option<LocatorHint> {
        None
    }

    fn act(&self, _checkpoint: &StageCheckpoint) -> ActStep {
        ActStep::Scroll { dy: self.scroll_px }
    }

    fn confirmation(&self) -> Confirmation {
        Confirmation::Responses {
            endpoint: Self::ENDPOINT.into(),
            min_count: 1,
        }
    }

    fn harvest(&self, records: &[MonitoredRecord]) -> Vec<String> {
        self.extractor.extract_all(records)
    }

    fn next_cursor(&self, checkpoint: &StageCheckpoint) -> Option<String> {
        let rounds = checkpoint
            .cursor()
            .and_then(|c| c.strip_prefix("scroll:"))
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0);
        Some(format!("scroll:{}", rounds + 1))
    }
}

/// Flip a toggle (like, collect) and confirm it server-side.
#[derive(Clone, Debug)]
pub struct InteractWorkflow {
    label: String,
    endpoint: String,
    endpoints: EndpointSet,
    control: LocatorHint,
}

impl InteractWorkflow {
    /// `endpoint` must name a rule in `endpoints` that has an opposite.
    pub fn new(
        label: impl Into<String>,
        endpoint: impl Into<String>,
        endpoints: EndpointSet,
        control: LocatorHint,
    ) -> Self {
        Self {
            label: label.into(),
            endpoint: endpoint.into(),
            endpoints,
            control,
        }
    }

    pub fn like(like_url: &str, unlike_url: &str) -> Self {
        Self::new(
            "like",
            "like",
            EndpointSet::new().like_toggle(like_url, unlike_url),
            LocatorHint::new()
                .alias("like_button")
                .role("button")
                .text("Like"),
        )
    }

    pub fn collect(collect_url: &str, uncollect_url: &str) -> Self {
        Self::new(
            "collect",
            "collect",
            EndpointSet::new().collect_toggle(collect_url, uncollect_url),
            LocatorHint::new()
                .alias("collect_button")
                .role("button")
                .text("Collect"),
        )
    }

    pub fn with_control(mut self, hint: LocatorHint) -> Self {
        self.control = hint;
        self
    }
}

impl Workflow for InteractWorkflow {
    fn label(&self) -> &str {
        &self.label
    }

    fn target_max(&self) -> u32 {
        1
    }

    fn endpoints(&self) -> EndpointSet {
        self.endpoints.clone()
    }

    fn locate(&self, _checkpoint: &StageCheckpoint) -> Option<LocatorHint> {
        Some(self.control.clone())
    }

    fn act(&self, _checkpoint: &StageCheckpoint) -> ActStep {
        ActStep::Click {
            label: format!("{}_button", self.label),
        }
    }

    fn confirmation(&self) -> Confirmation {
        Confirmation::Toggle {
            endpoint: self.endpoint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(body: Value, status: u16) -> MonitoredRecord {
        MonitoredRecord::from_response("feed", "r", "/api/feed", status, body, None)
    }

    #[test]
    fn extractor_reads_string_and_numeric_ids() {
        let extractor = ItemExtractor::default();
        let body = json!({"data": {"items": [{"id": "a"}, {"id": 42}, {"id": ""}, {"title": "x"}]}});
        assert_eq!(extractor.extract(&body), vec!["a", "42"]);
        assert!(extractor.extract(&json!({"data": {}})).is_empty());
    }

    #[test]
    fn failed_records_are_not_harvested() {
        let extractor = ItemExtractor::default();
        let records = vec![
            record(json!({"data": {"items": [{"id": "a"}]}}), 200),
            record(json!({"data": {"items": [{"id": "b"}]}}), 500),
        ];
        assert_eq!(extractor.extract_all(&records), vec!["a"]);
    }

    #[test]
    fn search_types_first_then_pages() {
        let workflow = SearchWorkflow::new("rust", 10, "/api/search");
        let first = StageCheckpoint::create_initial(10, 5, 10);
        assert!(matches!(workflow.act(&first), ActStep::TypeAndSubmit { .. }));
        assert_eq!(workflow.next_cursor(&first).as_deref(), Some("page:1"));

        let paged = first.builder().cursor(Some("page:1".into())).build();
        assert!(matches!(workflow.act(&paged), ActStep::Click { .. }));
        assert_eq!(workflow.next_cursor(&paged).as_deref(), Some("page:2"));
        assert_eq!(
            workflow.locate(&paged).unwrap().aliases,
            vec!["next_page".to_string()]
        );
    }

    #[test]
    fn interact_confirms_by_toggle() {
        let workflow = InteractWorkflow::like("/api/like", "/api/unlike");
        assert_eq!(workflow.target_max(), 1);
        assert_eq!(
            workflow.confirmation(),
            Confirmation::Toggle {
                endpoint: "like".into()
            }
        );
        assert_eq!(workflow.endpoints().opposite_of("like"), Some("unlike"));
        assert!(workflow.verify(&[]).is_err());
    }
}
