//! Element resolution strategies
//!
//! Three strategies in fallback order:
//! 1. Alias - selectors from the maintained alias table
//! 2. RoleName - ARIA role plus accessible name
//! 3. FuzzyText - normalised text containment over interactive elements

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use waymark_core_types::{ElementHandle, PageSession};

use crate::alias::AliasTable;
use crate::errors::LocatorError;
use crate::types::{Candidate, LocatorHint, LocatorStrategy};

/// Strategy trait for element resolution
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Visible candidates for the hint; empty when the strategy does not apply.
    async fn candidates(
        &self,
        session: &dyn PageSession,
        hint: &LocatorHint,
    ) -> Result<Vec<Candidate>, LocatorError>;

    fn strategy_type(&self) -> LocatorStrategy;

    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

pub(crate) fn is_visible(element: &ElementHandle) -> bool {
    element.visible && element.rect.map_or(true, |rect| !rect.is_empty())
}

fn strategy_failed(strategy: LocatorStrategy, reason: impl ToString) -> LocatorError {
    LocatorError::StrategyFailed {
        strategy: strategy.name().to_string(),
        reason: reason.to_string(),
    }
}

pub struct AliasStrategy {
    table: Arc<AliasTable>,
}

impl AliasStrategy {
    pub fn new(table: Arc<AliasTable>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl Strategy for AliasStrategy {
    async fn candidates(
        &self,
        session: &dyn PageSession,
        hint: &LocatorHint,
    ) -> Result<Vec<Candidate>, LocatorError> {
        for alias in &hint.aliases {
            for selector in self.table.selectors(alias) {
                let found = session
                    .query_selector_all(selector)
                    .await
                    .map_err(|err| strategy_failed(LocatorStrategy::Alias, err))?;
                let visible: Vec<Candidate> = found
                    .into_iter()
                    .filter(is_visible)
                    .map(|el| Candidate::new(el, LocatorStrategy::Alias, 1.0))
                    .collect();
                if !visible.is_empty() {
                    debug!(alias = %alias, matches = visible.len(), "alias hit");
                    return Ok(visible);
                }
            }
        }
        Ok(Vec::new())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Alias
    }
}

pub struct RoleNameStrategy;

#[async_trait]
impl Strategy for RoleNameStrategy {
    async fn candidates(
        &self,
        session: &dyn PageSession,
        hint: &LocatorHint,
    ) -> Result<Vec<Candidate>, LocatorError> {
        let Some(role) = hint.role.as_deref().filter(|r| !r.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let name = hint
            .name_or_text
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let found = session
            .query_by_role(role, name)
            .await
            .map_err(|err| strategy_failed(LocatorStrategy::RoleName, err))?;
        Ok(found
            .into_iter()
            .filter(is_visible)
            .map(|el| Candidate::new(el, LocatorStrategy::RoleName, 1.0))
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::RoleName
    }
}

pub struct FuzzyTextStrategy {
    min_score: f64,
}

impl FuzzyTextStrategy {
    pub fn new(min_score: f64) -> Self {
        Self { min_score }
    }
}

#[async_trait]
impl Strategy for FuzzyTextStrategy {
    async fn candidates(
        &self,
        session: &dyn PageSession,
        hint: &LocatorHint,
    ) -> Result<Vec<Candidate>, LocatorError> {
        let Some(needle) = hint.name_or_text.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let elements = session
            .interactive_elements()
            .await
            .map_err(|err| strategy_failed(LocatorStrategy::FuzzyText, err))?;
        Ok(elements
            .into_iter()
            .filter(is_visible)
            .filter_map(|el| {
                let score = [el.name.as_deref(), el.text.as_deref()]
                    .into_iter()
                    .flatten()
                    .map(|label| fuzzy_score(needle, label))
                    .fold(0.0, f64::max);
                (score >= self.min_score && score > 0.0)
                    .then(|| Candidate::new(el, LocatorStrategy::FuzzyText, score))
            })
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::FuzzyText
    }
}

/// Lowercase and collapse runs of whitespace.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Containment score of `candidate` against `needle`.
///
/// exact 1.0, candidate contains needle 0.8, needle contains candidate 0.6,
/// otherwise half the token overlap ratio when at least half the needle
/// tokens are present.
pub fn fuzzy_score(needle: &str, candidate: &str) -> f64 {
    let needle = normalize_text(needle);
    let candidate = normalize_text(candidate);
    if needle.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if needle == candidate {
        return 1.0;
    }
    if candidate.contains(&needle) {
        return 0.8;
    }
    if needle.contains(&candidate) {
        return 0.6;
    }
    let wanted: HashSet<&str> = needle.split(' ').collect();
    let present: HashSet<&str> = candidate.split(' ').collect();
    let ratio = wanted.intersection(&present).count() as f64 / wanted.len() as f64;
    if ratio >= 0.5 {
        0.5 * ratio
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzzy_score_ladder() {
        assert_eq!(fuzzy_score("Like", "  like "), 1.0);
        assert_eq!(fuzzy_score("like", "Like this note"), 0.8);
        assert_eq!(fuzzy_score("add to favourites", "favourites"), 0.6);
        assert!((fuzzy_score("save post now", "post now later") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(fuzzy_score("save post now", "unrelated"), 0.0);
        assert_eq!(fuzzy_score("", "anything"), 0.0);
    }

    #[test]
    fn normalisation_collapses_whitespace() {
        assert_eq!(normalize_text("  Add\tTo\n Cart "), "add to cart");
    }

    #[test]
    fn hidden_or_zero_sized_elements_are_invisible() {
        use waymark_core_types::Rect;
        let shown = ElementHandle::new("1")
            .visible(true)
            .with_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let hidden = ElementHandle::new("2").visible(false);
        let collapsed = ElementHandle::new("3")
            .visible(true)
            .with_rect(Rect::new(0.0, 0.0, 0.0, 10.0));
        assert!(is_visible(&shown));
        assert!(!is_visible(&hidden));
        assert!(!is_visible(&collapsed));
    }
}
