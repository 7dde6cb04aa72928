use std::time::{Duration, Instant};

use serde_json::json;
use stealth::{MotionRng, TrajectoryGenerator};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use waymark_core_types::{DriveError, ElementHandle, FailureKind, PageSession, Point};

use crate::errors::ClickError;
use crate::gate::{ScriptEvaluationGate, SCRIPTED_CLICK_PATH};
use crate::metrics;
use crate::model::{ClickParams, ClickReport, ClickTier, ExecCtx, TrajectorySummary};
use crate::policy::ClickPolicyView;
use crate::ports::DomStateInspector;
use crate::{physical, precheck};

const SCRIPTED_CLICK_SCRIPT: &str = r#"(arg) => {
  const el = arg.element;
  if (!el) throw new Error('element detached');
  const opts = { bubbles: true, cancelable: true, view: window };
  el.dispatchEvent(new MouseEvent('mousedown', opts));
  el.dispatchEvent(new MouseEvent('mouseup', opts));
  el.dispatchEvent(new MouseEvent('click', opts));
  return true;
}"#;

pub(crate) struct RuntimeDeps<'a> {
    pub policy: &'a ClickPolicyView,
    pub gate: &'a ScriptEvaluationGate,
    pub inspector: &'a dyn DomStateInspector,
    pub generator: &'a TrajectoryGenerator,
    pub rng: &'a MotionRng,
}

pub(crate) struct Executed {
    pub report: ClickReport,
    /// Where the pointer rests afterwards, when known.
    pub pointer: Option<Point>,
}

/// Sleep that yields to cancellation.
pub(crate) async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<(), ClickError> {
    if duration.is_zero() {
        return if cancel.is_cancelled() {
            Err(ClickError::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(ClickError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[instrument(skip_all, fields(op = %ctx.operation_id, target = %params.label))]
pub(crate) async fn execute(
    ctx: &ExecCtx,
    session: &dyn PageSession,
    params: &ClickParams,
    pointer: Point,
    deps: RuntimeDeps<'_>,
) -> Result<Executed, ClickError> {
    if ctx.cancel.is_cancelled() {
        return Err(ClickError::Cancelled);
    }
    let started_at = Instant::now();
    let element = &params.element;

    let dom = precheck::run_preflight(deps.inspector, session, element, deps.policy, &ctx.cancel)
        .await?;

    let physical = physical::assess(session, deps.gate, element).await;
    if !physical.likely_clickable() {
        debug!(?physical, "physical assessment reports a blocker");
    }

    if let Err(err) = session.hover(element).await {
        debug!(%err, "hover failed");
    }
    let dwell = deps
        .rng
        .range_u64(deps.policy.hover_dwell_min_ms, deps.policy.hover_dwell_max_ms);
    pause(&ctx.cancel, Duration::from_millis(dwell)).await?;

    let mut attempts = 0u32;
    let mut last_error: Option<DriveError> = None;
    for tier in ClickTier::ORDER {
        if tier == ClickTier::Scripted && !deps.policy.scripted_dispatch_enabled {
            metrics::record_tier_skipped(tier);
            continue;
        }
        attempts += 1;
        pause(&ctx.cancel, deps.policy.backoff(attempts)).await?;

        let outcome = match tier {
            ClickTier::Regular => session.click_element(element).await.map(|_| None),
            ClickTier::Scripted => deps
                .gate
                .evaluate(
                    session,
                    SCRIPTED_CLICK_PATH,
                    SCRIPTED_CLICK_SCRIPT,
                    json!({ "node_id": element.node_id }),
                )
                .await
                .map(|_| None),
            ClickTier::Coordinate => {
                coordinate_click(session, element, pointer, &ctx.cancel, &deps)
                    .await
                    .map(Some)
            }
        };

        match outcome {
            Ok(trajectory) => {
                metrics::record_tier(tier, true);
                let resting = match &trajectory {
                    Some((_, aim)) => Some(*aim),
                    None => element.rect.map(|rect| rect.center()),
                };
                let latency_ms = started_at.elapsed().as_millis();
                info!(tier = tier.as_str(), attempts, latency_ms, "click delivered");
                return Ok(Executed {
                    report: ClickReport {
                        tier,
                        attempts,
                        dom,
                        physical,
                        trajectory: trajectory.map(|(summary, _)| summary),
                        started_at,
                        latency_ms,
                    },
                    pointer: resting,
                });
            }
            Err(err) if err.kind == FailureKind::Cancelled => return Err(ClickError::Cancelled),
            Err(err) => {
                metrics::record_tier(tier, false);
                warn!(tier = tier.as_str(), %err, "click tier failed");
                last_error = Some(err);
            }
        }
    }

    let last = last_error.unwrap_or_else(|| {
        DriveError::new(FailureKind::ClickExhausted, "no click tier was available")
    });
    Err(ClickError::Exhausted { attempts, last })
}

async fn coordinate_click(
    session: &dyn PageSession,
    element: &ElementHandle,
    from: Point,
    cancel: &CancellationToken,
    deps: &RuntimeDeps<'_>,
) -> Result<(TrajectorySummary, Point), DriveError> {
    let rect = session
        .bounding_box(element)
        .await?
        .or(element.rect)
        .filter(|rect| !rect.is_empty())
        .ok_or_else(|| DriveError::session("target has no layout box"))?;

    let trajectory = deps.generator.plan(from, &rect, deps.rng);
    let mut previous = from;
    let distances: Vec<f64> = trajectory
        .points
        .iter()
        .map(|point| {
            let step = previous.distance_to(&point.at);
            previous = point.at;
            step
        })
        .collect();
    metrics::record_trajectory(trajectory.steps(), trajectory.total_ms, distances.into_iter());

    for point in &trajectory.points {
        session.mouse_move(point.at).await?;
        pause(cancel, Duration::from_millis(point.pause_ms))
            .await
            .map_err(|_| DriveError::cancelled())?;
    }
    session.mouse_click(trajectory.aim).await?;

    Ok((
        TrajectorySummary {
            steps: trajectory.steps(),
            total_ms: trajectory.total_ms,
            max_step_px: trajectory.max_step_px,
            mean_step_px: trajectory.mean_step_px,
            hotspots: trajectory.hotspots(),
        },
        trajectory.aim,
    ))
}
