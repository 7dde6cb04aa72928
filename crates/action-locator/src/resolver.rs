//! Element locator with fallback chain orchestration

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stealth::MotionRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use waymark_core_types::PageSession;

use crate::alias::AliasTable;
use crate::errors::LocatorError;
use crate::strategies::{AliasStrategy, FuzzyTextStrategy, RoleNameStrategy, Strategy};
use crate::types::{Acquired, Candidate, LocatorConfig, LocatorHint, LocatorStrategy};

#[async_trait]
pub trait ElementLocator: Send + Sync {
    /// Resolve the hint to a visible control.
    ///
    /// A miss is `Ok` with an empty [`Acquired`]; only cancellation errors.
    async fn acquire(
        &self,
        session: &dyn PageSession,
        hint: &LocatorHint,
        cancel: &CancellationToken,
    ) -> Result<Acquired, LocatorError>;
}

pub struct DefaultElementLocator {
    strategies: Vec<Arc<dyn Strategy>>,
    config: LocatorConfig,
    rng: MotionRng,
}

impl DefaultElementLocator {
    pub fn new(aliases: Arc<AliasTable>, config: LocatorConfig) -> Self {
        Self::with_rng(aliases, config, MotionRng::shared())
    }

    pub fn with_rng(aliases: Arc<AliasTable>, config: LocatorConfig, rng: MotionRng) -> Self {
        let strategies: Vec<Arc<dyn Strategy>> = vec![
            Arc::new(AliasStrategy::new(aliases)),
            Arc::new(RoleNameStrategy),
            Arc::new(FuzzyTextStrategy::new(config.min_fuzzy_score)),
        ];
        Self {
            strategies,
            config,
            rng,
        }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// One pass over the strategy chain against the current DOM.
    async fn scan(
        &self,
        session: &dyn PageSession,
        hint: &LocatorHint,
    ) -> Option<(Candidate, LocatorStrategy)> {
        for strategy in &self.strategies {
            match strategy.candidates(session, hint).await {
                Ok(candidates) if !candidates.is_empty() => {
                    let kind = strategy.strategy_type();
                    return self.select(candidates, kind).map(|best| (best, kind));
                }
                Ok(_) => debug!(strategy = strategy.name(), "no candidates"),
                Err(err) => warn!(strategy = strategy.name(), %err, "strategy failed"),
            }
        }
        None
    }

    /// Alias and role hits keep document order; fuzzy ties are broken at
    /// random so the same element is not always picked.
    fn select(&self, mut candidates: Vec<Candidate>, kind: LocatorStrategy) -> Option<Candidate> {
        if kind != LocatorStrategy::FuzzyText {
            return candidates.into_iter().next();
        }
        let top = candidates
            .iter()
            .map(|c| c.score)
            .fold(f64::NEG_INFINITY, f64::max);
        candidates.retain(|c| (c.score - top).abs() < f64::EPSILON);
        let idx = self.rng.pick_index(candidates.len())?;
        Some(candidates.swap_remove(idx))
    }

    async fn settle(&self, cancel: &CancellationToken) -> Result<(), LocatorError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(LocatorError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(self.config.settle_ms)) => Ok(()),
        }
    }
}

#[async_trait]
impl ElementLocator for DefaultElementLocator {
    #[instrument(skip_all, fields(hint = %hint.describe()))]
    async fn acquire(
        &self,
        session: &dyn PageSession,
        hint: &LocatorHint,
        cancel: &CancellationToken,
    ) -> Result<Acquired, LocatorError> {
        if cancel.is_cancelled() {
            return Err(LocatorError::Cancelled);
        }
        if let Some((best, strategy)) = self.scan(session, hint).await {
            info!(strategy = strategy.name(), score = best.score, "element located");
            return Ok(Acquired {
                element: Some(best.element),
                strategy: Some(strategy),
                scroll_rounds: 0,
            });
        }

        for round in 1..=self.config.max_scroll_rounds {
            if cancel.is_cancelled() {
                return Err(LocatorError::Cancelled);
            }
            if let Err(err) = session.wheel(0.0, self.config.scroll_step_px).await {
                warn!(round, %err, "scroll failed, giving up rescan");
                return Ok(Acquired::miss(round - 1));
            }
            self.settle(cancel).await?;
            if let Some((best, strategy)) = self.scan(session, hint).await {
                info!(
                    strategy = strategy.name(),
                    score = best.score,
                    scroll_rounds = round,
                    "element located after scrolling"
                );
                return Ok(Acquired {
                    element: Some(best.element),
                    strategy: Some(strategy),
                    scroll_rounds: round,
                });
            }
        }

        info!(
            scroll_rounds = self.config.max_scroll_rounds,
            "locator exhausted"
        );
        Ok(Acquired::miss(self.config.max_scroll_rounds))
    }
}
