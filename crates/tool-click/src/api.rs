use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use stealth::{ConfigError, MotionRng, TrajectoryGenerator};
use tracing::debug;
use waymark_core_types::{PageId, PageSession, Point};

use crate::errors::ClickError;
use crate::gate::ScriptEvaluationGate;
use crate::model::{ClickParams, ClickReport, ExecCtx};
use crate::policy::ClickPolicyView;
use crate::ports::{DomStateInspector, ScriptedDomInspector};
use crate::runner::{execute, pause, RuntimeDeps};

#[async_trait]
pub trait ClickPolicy: Send + Sync {
    async fn click(
        &self,
        ctx: &ExecCtx,
        session: &dyn PageSession,
        params: ClickParams,
    ) -> Result<ClickReport, ClickError>;

    /// Click the field, then type `text` with per-character pacing.
    async fn type_into(
        &self,
        ctx: &ExecCtx,
        session: &dyn PageSession,
        params: ClickParams,
        text: &str,
    ) -> Result<ClickReport, ClickError>;
}

pub struct HumanClickPolicyBuilder {
    policy: ClickPolicyView,
    gate: Option<Arc<ScriptEvaluationGate>>,
    inspector: Option<Arc<dyn DomStateInspector>>,
    rng: Option<MotionRng>,
}

impl HumanClickPolicyBuilder {
    pub fn new(policy: ClickPolicyView) -> Self {
        Self {
            policy,
            gate: None,
            inspector: None,
            rng: None,
        }
    }

    pub fn with_gate(mut self, gate: Arc<ScriptEvaluationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn DomStateInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    pub fn with_rng(mut self, rng: MotionRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Fails when the policy view does not validate.
    pub fn build(self) -> Result<HumanClickPolicy, ConfigError> {
        self.policy.validate()?;
        let gate = self
            .gate
            .unwrap_or_else(|| Arc::new(ScriptEvaluationGate::standard()));
        let inspector = self
            .inspector
            .unwrap_or_else(|| Arc::new(ScriptedDomInspector::new(gate.clone())));
        Ok(HumanClickPolicy {
            generator: TrajectoryGenerator::new(self.policy.trajectory.clone()),
            policy: self.policy,
            gate,
            inspector,
            rng: self.rng.unwrap_or_else(MotionRng::shared),
            pointers: DashMap::new(),
        })
    }
}

/// Production click policy: preflight, physical assessment, hover, then
/// regular, scripted and coordinate tiers.
pub struct HumanClickPolicy {
    policy: ClickPolicyView,
    gate: Arc<ScriptEvaluationGate>,
    inspector: Arc<dyn DomStateInspector>,
    generator: TrajectoryGenerator,
    rng: MotionRng,
    pointers: DashMap<PageId, Point>,
}

impl HumanClickPolicy {
    pub fn builder(policy: ClickPolicyView) -> HumanClickPolicyBuilder {
        HumanClickPolicyBuilder::new(policy)
    }

    pub fn gate(&self) -> &Arc<ScriptEvaluationGate> {
        &self.gate
    }

    pub fn policy(&self) -> &ClickPolicyView {
        &self.policy
    }

    /// Last known pointer position on a page.
    pub fn pointer(&self, page: &PageId) -> Option<Point> {
        self.pointers.get(page).map(|entry| *entry.value())
    }

    pub fn forget_page(&self, page: &PageId) {
        self.pointers.remove(page);
    }

    /// Unknown pointers start somewhere random inside the viewport.
    async fn starting_pointer(&self, page: &PageId, session: &dyn PageSession) -> Point {
        if let Some(point) = self.pointer(page) {
            return point;
        }
        match session.viewport().await {
            Ok(viewport) => Point::new(
                viewport.x + self.rng.range_f64(0.0, viewport.width),
                viewport.y + self.rng.range_f64(0.0, viewport.height),
            ),
            Err(err) => {
                debug!(%err, "viewport unavailable, starting pointer at origin");
                Point::default()
            }
        }
    }
}

#[async_trait]
impl ClickPolicy for HumanClickPolicy {
    async fn click(
        &self,
        ctx: &ExecCtx,
        session: &dyn PageSession,
        params: ClickParams,
    ) -> Result<ClickReport, ClickError> {
        let from = self.starting_pointer(&ctx.page, session).await;
        let deps = RuntimeDeps {
            policy: &self.policy,
            gate: self.gate.as_ref(),
            inspector: self.inspector.as_ref(),
            generator: &self.generator,
            rng: &self.rng,
        };
        let executed = execute(ctx, session, &params, from, deps).await?;
        if let Some(point) = executed.pointer {
            self.pointers.insert(ctx.page.clone(), point);
        }
        Ok(executed.report)
    }

    async fn type_into(
        &self,
        ctx: &ExecCtx,
        session: &dyn PageSession,
        params: ClickParams,
        text: &str,
    ) -> Result<ClickReport, ClickError> {
        let report = self.click(ctx, session, params).await?;
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            pause(&ctx.cancel, self.rng.typing_delay(&self.policy.typing)).await?;
            session
                .type_text(ch.encode_utf8(&mut buf))
                .await
                .map_err(ClickError::Input)?;
        }
        Ok(report)
    }
}
