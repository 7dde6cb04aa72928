//! Checkpointed per-attempt stage sequence.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use action_locator::{ElementLocator, LocatorError};
use confirm_tap::{ActionConfirmationMonitor, MonitoredRecord, ToggleOutcome};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tool_click::{ClickParams, ClickPolicy, ExecCtx};
use tracing::{debug, info, instrument, warn};
use waymark_checkpoint_store::{CheckpointEnvelope, CheckpointStore, StoreError};
use waymark_core_types::{DriveError, ElementHandle, FailureKind, OperationId, PageId, PageSession};

use crate::checkpoint::StageCheckpoint;
use crate::config::FlowConfig;
use crate::digest::digest_of;
use crate::errors::{FlowError, StageError};
use crate::guard::PageGuard;
use crate::metrics;
use crate::stage::Stage;
use crate::workflow::{ActStep, Confirmation, Workflow};

/// Inputs of one [`OperationStateMachine::run_or_resume`] call.
pub struct RunContext {
    pub operation_id: OperationId,
    pub store: Arc<dyn CheckpointStore>,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(operation_id: OperationId, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            operation_id,
            store,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub completed: bool,
    pub last_checkpoint: StageCheckpoint,
    /// Seq of the last record written (or loaded) for the operation.
    pub seq: i64,
}

impl RunOutcome {
    pub fn last_error(&self) -> Option<&StageError> {
        self.last_checkpoint.last_error()
    }
}

/// Proof that the confirmation monitor was bound in the current attempt.
///
/// Only the Bind stage can produce one and the confirmation wait consumes
/// it, so waiting on an unbound monitor does not type-check.
#[derive(Debug)]
pub struct Bound {
    bound_at: Instant,
}

/// Result of the AwaitConfirmation stage.
enum Confirmed {
    Records(Vec<MonitoredRecord>),
    Toggle(Vec<MonitoredRecord>),
}

/// Why an attempt stopped early.
enum Interrupt {
    Stage(StageError),
    Store(StoreError),
}

impl From<StageError> for Interrupt {
    fn from(err: StageError) -> Self {
        Interrupt::Stage(err)
    }
}

impl From<StoreError> for Interrupt {
    fn from(err: StoreError) -> Self {
        Interrupt::Store(err)
    }
}

/// Appends checkpoints with strictly increasing seq.
struct Journal<'a> {
    store: &'a dyn CheckpointStore,
    operation: &'a OperationId,
    seq: i64,
}

impl Journal<'_> {
    async fn write(&mut self, checkpoint: &StageCheckpoint) -> Result<(), StoreError> {
        let payload = checkpoint.to_payload()?;
        let next = self.seq + 1;
        self.store
            .save(CheckpointEnvelope::new(self.operation.clone(), next, payload))
            .await?;
        self.seq = next;
        Ok(())
    }
}

pub struct OperationStateMachineBuilder {
    session: Option<Arc<dyn PageSession>>,
    page: PageId,
    guard: Option<Arc<dyn PageGuard>>,
    locator: Option<Arc<dyn ElementLocator>>,
    click: Option<Arc<dyn ClickPolicy>>,
    monitor: Option<Arc<dyn ActionConfirmationMonitor>>,
    workflow: Option<Arc<dyn Workflow>>,
    config: FlowConfig,
}

impl OperationStateMachineBuilder {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            session: None,
            page: PageId::new(),
            guard: None,
            locator: None,
            click: None,
            monitor: None,
            workflow: None,
            config,
        }
    }

    pub fn with_session(mut self, session: Arc<dyn PageSession>, page: PageId) -> Self {
        self.session = Some(session);
        self.page = page;
        self
    }

    pub fn with_guard(mut self, guard: Arc<dyn PageGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn ElementLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_click_policy(mut self, click: Arc<dyn ClickPolicy>) -> Self {
        self.click = Some(click);
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn ActionConfirmationMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_workflow(mut self, workflow: Arc<dyn Workflow>) -> Self {
        self.workflow = Some(workflow);
        self
    }

    pub fn build(self) -> Result<OperationStateMachine, FlowError> {
        self.config.validate()?;
        let workflow = self.workflow.ok_or(FlowError::MissingCollaborator("workflow"))?;
        if workflow.target_max() == 0 {
            return Err(FlowError::InvalidConfig(
                "workflow target_max must be at least 1".into(),
            ));
        }
        Ok(OperationStateMachine {
            session: self.session.ok_or(FlowError::MissingCollaborator("session"))?,
            page: self.page,
            guard: self.guard.ok_or(FlowError::MissingCollaborator("page guard"))?,
            locator: self.locator.ok_or(FlowError::MissingCollaborator("locator"))?,
            click: self.click.ok_or(FlowError::MissingCollaborator("click policy"))?,
            monitor: self.monitor.ok_or(FlowError::MissingCollaborator("monitor"))?,
            workflow,
            config: self.config,
        })
    }
}

/// Drives one workflow on one page session, resuming from the checkpoint log.
pub struct OperationStateMachine {
    session: Arc<dyn PageSession>,
    page: PageId,
    guard: Arc<dyn PageGuard>,
    locator: Arc<dyn ElementLocator>,
    click: Arc<dyn ClickPolicy>,
    monitor: Arc<dyn ActionConfirmationMonitor>,
    workflow: Arc<dyn Workflow>,
    config: FlowConfig,
}

impl OperationStateMachine {
    pub fn builder(config: FlowConfig) -> OperationStateMachineBuilder {
        OperationStateMachineBuilder::new(config)
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Load or create the checkpoint and run attempts until it completes,
    /// a stage halts, or `cancel` fires.
    ///
    /// Stage failures come back as data on the outcome; only checkpoint
    /// store failures are returned as errors.
    #[instrument(skip_all, fields(operation = %ctx.operation_id, workflow = self.workflow.label()))]
    pub async fn run_or_resume(&self, ctx: RunContext) -> Result<RunOutcome, StoreError> {
        let latest = ctx.store.load_latest(&ctx.operation_id).await?;
        let mut journal = Journal {
            store: ctx.store.as_ref(),
            operation: &ctx.operation_id,
            seq: latest.as_ref().map(|envelope| envelope.seq).unwrap_or(0),
        };
        let mut checkpoint = match latest {
            Some(envelope) => {
                let checkpoint = StageCheckpoint::from_payload(envelope.payload)?;
                info!(
                    seq = envelope.seq,
                    stage = %checkpoint.stage(),
                    attempt = checkpoint.attempt(),
                    "resuming from checkpoint"
                );
                checkpoint
            }
            None => {
                let checkpoint = StageCheckpoint::create_initial(
                    self.workflow.target_max(),
                    self.config.max_attempts,
                    self.config.digest_cap,
                );
                journal.write(&checkpoint).await?;
                checkpoint
            }
        };

        let exec = ExecCtx::new(ctx.operation_id.clone(), self.page.clone(), ctx.cancel.clone());
        while !checkpoint.completed() {
            if ctx.cancel.is_cancelled() {
                info!("cancelled before next attempt");
                break;
            }
            let mut current = checkpoint
                .builder()
                .step(checkpoint.step() + 1)
                .attempt(checkpoint.attempt() + 1)
                .stage(Stage::EnsureContext)
                .last_error(None)
                .build();
            debug!(attempt = current.attempt(), "attempt started");

            let result = AssertUnwindSafe(self.attempt(&mut current, &mut journal, &exec))
                .catch_unwind()
                .await;
            let failure = match result {
                Ok(Ok(())) => {
                    checkpoint = current;
                    continue;
                }
                Ok(Err(Interrupt::Store(err))) => return Err(err),
                Ok(Err(Interrupt::Stage(err))) => err,
                Err(panic) => StageError::new(
                    current.stage(),
                    FailureKind::Session,
                    format!("stage panicked: {}", panic_message(panic.as_ref())),
                ),
            };

            let retry = failure.stage == Stage::AwaitConfirmation
                && failure.kind == FailureKind::ConfirmationTimeout;
            checkpoint = self.record_failure(&mut journal, current, failure).await?;
            if !retry || checkpoint.completed() {
                break;
            }
            let backoff = self.config.retry_backoff(checkpoint.attempt());
            debug!(backoff_ms = backoff.as_millis() as u64, "retrying after backoff");
            if pause(&ctx.cancel, backoff).await.is_err() {
                break;
            }
        }

        info!(
            completed = checkpoint.completed(),
            aggregated = checkpoint.aggregated(),
            attempt = checkpoint.attempt(),
            seq = journal.seq,
            "run finished"
        );
        Ok(RunOutcome {
            completed: checkpoint.completed(),
            last_checkpoint: checkpoint,
            seq: journal.seq,
        })
    }

    /// One full pass over the stage sequence. Each completed stage is
    /// written before the next one starts.
    async fn attempt(
        &self,
        checkpoint: &mut StageCheckpoint,
        journal: &mut Journal<'_>,
        exec: &ExecCtx,
    ) -> Result<(), Interrupt> {
        let session = self.session.as_ref();

        let started = enter(checkpoint, Stage::EnsureContext, &exec.cancel)?;
        if !self.guard.ensure_on_known_entry_state(session).await {
            return Err(StageError::new(
                Stage::EnsureContext,
                FailureKind::ContextNotReady,
                "page is not on a known entry state",
            )
            .into());
        }
        commit(checkpoint, journal, started).await?;

        let element = match self.workflow.locate(checkpoint) {
            Some(hint) => {
                let started = enter(checkpoint, Stage::Locate, &exec.cancel)?;
                let acquired = match self.locator.acquire(session, &hint, &exec.cancel).await {
                    Ok(acquired) => acquired,
                    Err(LocatorError::Cancelled) => {
                        return Err(StageError::cancelled(Stage::Locate).into())
                    }
                    Err(err) => return Err(StageError::from_drive(Stage::Locate, err.into()).into()),
                };
                let Some(element) = acquired.element else {
                    return Err(StageError::new(
                        Stage::Locate,
                        FailureKind::ElementNotFound,
                        format!(
                            "{} not found after {} scroll rounds",
                            hint.describe(),
                            acquired.scroll_rounds
                        ),
                    )
                    .into());
                };
                commit(checkpoint, journal, started).await?;
                Some(element)
            }
            None => None,
        };

        let started = enter(checkpoint, Stage::Bind, &exec.cancel)?;
        let bound = self.bind().await?;
        commit(checkpoint, journal, started).await?;

        let started = enter(checkpoint, Stage::Act, &exec.cancel)?;
        self.act(checkpoint, element, exec).await?;
        commit(checkpoint, journal, started).await?;

        let started = enter(checkpoint, Stage::AwaitConfirmation, &exec.cancel)?;
        let confirmed = self.await_confirmation(bound, &exec.cancel).await?;
        commit(checkpoint, journal, started).await?;

        match confirmed {
            Confirmed::Records(records) => {
                let started = enter(checkpoint, Stage::Aggregate, &exec.cancel)?;
                let ids = self.workflow.harvest(&records);
                let mut processed = checkpoint.processed().clone();
                let fresh = ids
                    .iter()
                    .filter(|id| processed.observe(digest_of(id)))
                    .count() as u32;
                *checkpoint = checkpoint
                    .builder()
                    .processed(processed)
                    .aggregated(checkpoint.aggregated().saturating_add(fresh))
                    .last_batch(fresh)
                    .cursor(self.workflow.next_cursor(checkpoint))
                    .build();
                info!(
                    observed = ids.len(),
                    fresh,
                    aggregated = checkpoint.aggregated(),
                    "batch aggregated"
                );
                commit(checkpoint, journal, started).await?;
            }
            Confirmed::Toggle(records) => {
                let started = enter(checkpoint, Stage::Verify, &exec.cancel)?;
                self.workflow.verify(&records).map_err(|reason| {
                    StageError::new(Stage::Verify, FailureKind::ConfirmationRejected, reason)
                })?;
                *checkpoint = checkpoint
                    .builder()
                    .aggregated(checkpoint.aggregated().saturating_add(1))
                    .last_batch(1)
                    .build();
                commit(checkpoint, journal, started).await?;
            }
        }

        let closing = if checkpoint.completed() {
            Stage::Finalize
        } else {
            Stage::Continue
        };
        *checkpoint = checkpoint.builder().stage(closing).build();
        journal.write(checkpoint).await?;
        Ok(())
    }

    async fn bind(&self) -> Result<Bound, StageError> {
        let endpoints = self.workflow.endpoints();
        if self
            .monitor
            .setup_monitor(self.session.as_ref(), endpoints)
            .await
        {
            Ok(Bound {
                bound_at: Instant::now(),
            })
        } else {
            Err(StageError::new(
                Stage::Bind,
                FailureKind::MonitorBindFailed,
                "confirmation monitor could not bind",
            ))
        }
    }

    async fn act(
        &self,
        checkpoint: &StageCheckpoint,
        element: Option<ElementHandle>,
        exec: &ExecCtx,
    ) -> Result<(), StageError> {
        let session = self.session.as_ref();
        let as_stage = |err: DriveError| StageError::from_drive(Stage::Act, err);

        match (self.workflow.act(checkpoint), element) {
            (ActStep::Scroll { dy }, _) => session.wheel(0.0, dy).await.map_err(as_stage),
            (ActStep::Click { label }, Some(element)) => {
                let report = self
                    .click
                    .click(exec, session, ClickParams::new(element, label))
                    .await
                    .map_err(|err| as_stage(err.into()))?;
                debug!(tier = report.tier.as_str(), attempts = report.attempts, "clicked");
                Ok(())
            }
            (ActStep::TypeAndSubmit { label, text }, Some(element)) => {
                self.click
                    .type_into(exec, session, ClickParams::new(element, label), &text)
                    .await
                    .map_err(|err| as_stage(err.into()))?;
                session.press_key("Enter").await.map_err(as_stage)
            }
            (_, None) => Err(StageError::new(
                Stage::Act,
                FailureKind::ElementNotFound,
                "no element located for the action",
            )),
        }
    }

    async fn await_confirmation(
        &self,
        bound: Bound,
        cancel: &CancellationToken,
    ) -> Result<Confirmed, StageError> {
        let timeout = self.config.confirm_timeout();
        let confirmed = match self.workflow.confirmation() {
            Confirmation::Responses {
                endpoint,
                min_count,
            } => {
                let arrived = tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(StageError::cancelled(Stage::AwaitConfirmation))
                    }
                    arrived = self.monitor.wait_for_responses(&endpoint, timeout, min_count) => arrived,
                };
                if !arrived {
                    return Err(StageError::new(
                        Stage::AwaitConfirmation,
                        FailureKind::ConfirmationTimeout,
                        format!("no {endpoint} response within {}ms", timeout.as_millis()),
                    ));
                }
                let records = self.monitor.get_monitored_details(&endpoint);
                self.monitor.clear_monitored_data(Some(&endpoint));
                Confirmed::Records(records)
            }
            Confirmation::Toggle { endpoint } => {
                match self.monitor.await_toggle(&endpoint, timeout, cancel).await {
                    ToggleOutcome::Confirmed => {
                        Confirmed::Toggle(self.monitor.get_monitored_details(&endpoint))
                    }
                    ToggleOutcome::OppositeFired => {
                        return Err(StageError::new(
                            Stage::AwaitConfirmation,
                            FailureKind::AmbiguousOppositeSignal,
                            format!("opposite of {endpoint} responded instead"),
                        ))
                    }
                    ToggleOutcome::TimedOut => {
                        return Err(StageError::new(
                            Stage::AwaitConfirmation,
                            FailureKind::ConfirmationTimeout,
                            format!("no {endpoint} response within {}ms", timeout.as_millis()),
                        ))
                    }
                    ToggleOutcome::Cancelled => {
                        return Err(StageError::cancelled(Stage::AwaitConfirmation))
                    }
                }
            }
        };
        debug!(
            since_bind_ms = bound.bound_at.elapsed().as_millis() as u64,
            "action confirmed"
        );
        Ok(confirmed)
    }

    /// Persist `failure` as the checkpoint's last error. Writes after a
    /// cancellation are best effort.
    async fn record_failure(
        &self,
        journal: &mut Journal<'_>,
        checkpoint: StageCheckpoint,
        failure: StageError,
    ) -> Result<StageCheckpoint, StoreError> {
        metrics::record_failure(failure.stage, self.workflow.label());
        warn!(
            stage = %failure.stage,
            kind = failure.kind.label(),
            attempt = checkpoint.attempt(),
            "stage failed"
        );
        let cancelled = failure.kind == FailureKind::Cancelled;
        let failed = checkpoint
            .builder()
            .stage(failure.stage)
            .last_error(Some(failure))
            .build();
        match journal.write(&failed).await {
            Ok(()) => Ok(failed),
            Err(err) if cancelled => {
                warn!(%err, "checkpoint write after cancellation failed");
                Ok(failed)
            }
            Err(err) => Err(err),
        }
    }
}

fn enter(
    checkpoint: &mut StageCheckpoint,
    stage: Stage,
    cancel: &CancellationToken,
) -> Result<Instant, StageError> {
    if cancel.is_cancelled() {
        return Err(StageError::cancelled(stage));
    }
    *checkpoint = checkpoint.builder().stage(stage).build();
    Ok(Instant::now())
}

async fn commit(
    checkpoint: &StageCheckpoint,
    journal: &mut Journal<'_>,
    started: Instant,
) -> Result<(), StoreError> {
    metrics::observe_stage(checkpoint.stage(), started.elapsed());
    journal.write(checkpoint).await
}

async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<(), ()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(()),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
