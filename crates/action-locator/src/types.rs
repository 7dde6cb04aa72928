//! Core types for locator system

use serde::{Deserialize, Serialize};
use waymark_core_types::ElementHandle;

/// Read-only description of the control a stage wants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocatorHint {
    /// Alias keys tried in order against the [`crate::AliasTable`].
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Accessible name for the role lookup, or text for the fuzzy scan.
    #[serde(default)]
    pub name_or_text: Option<String>,
}

impl LocatorHint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.name_or_text = Some(text.into());
        self
    }

    /// Short label for logs; aliases only, never free text.
    pub fn describe(&self) -> String {
        match (self.aliases.first(), &self.role) {
            (Some(alias), _) => format!("alias:{alias}"),
            (None, Some(role)) => format!("role:{role}"),
            (None, None) => "text".to_string(),
        }
    }
}

/// Locator strategies in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    Alias,
    RoleName,
    FuzzyText,
}

impl LocatorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Alias => "alias",
            LocatorStrategy::RoleName => "role_name",
            LocatorStrategy::FuzzyText => "fuzzy_text",
        }
    }

    pub fn fallback_chain() -> [LocatorStrategy; 3] {
        [
            LocatorStrategy::Alias,
            LocatorStrategy::RoleName,
            LocatorStrategy::FuzzyText,
        ]
    }
}

/// Element candidate with a match score in `0.0..=1.0`.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub element: ElementHandle,
    pub strategy: LocatorStrategy,
    pub score: f64,
}

impl Candidate {
    pub fn new(element: ElementHandle, strategy: LocatorStrategy, score: f64) -> Self {
        Self {
            element,
            strategy,
            score,
        }
    }
}

/// Result of [`crate::ElementLocator::acquire`].
#[derive(Debug, Clone, Default)]
pub struct Acquired {
    pub element: Option<ElementHandle>,
    pub strategy: Option<LocatorStrategy>,
    pub scroll_rounds: u32,
}

impl Acquired {
    pub fn miss(scroll_rounds: u32) -> Self {
        Self {
            element: None,
            strategy: None,
            scroll_rounds,
        }
    }

    pub fn is_found(&self) -> bool {
        self.element.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    #[serde(default = "LocatorConfig::default_max_scroll_rounds")]
    pub max_scroll_rounds: u32,
    #[serde(default = "LocatorConfig::default_scroll_step_px")]
    pub scroll_step_px: f64,
    #[serde(default = "LocatorConfig::default_settle_ms")]
    pub settle_ms: u64,
    /// Fuzzy matches scoring below this are ignored.
    #[serde(default = "LocatorConfig::default_min_fuzzy_score")]
    pub min_fuzzy_score: f64,
}

impl LocatorConfig {
    fn default_max_scroll_rounds() -> u32 {
        3
    }

    fn default_scroll_step_px() -> f64 {
        480.0
    }

    fn default_settle_ms() -> u64 {
        350
    }

    fn default_min_fuzzy_score() -> f64 {
        0.25
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_scroll_rounds: Self::default_max_scroll_rounds(),
            scroll_step_px: Self::default_scroll_step_px(),
            settle_ms: Self::default_settle_ms(),
            min_fuzzy_score: Self::default_min_fuzzy_score(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_chain_order() {
        assert_eq!(
            LocatorStrategy::fallback_chain(),
            [
                LocatorStrategy::Alias,
                LocatorStrategy::RoleName,
                LocatorStrategy::FuzzyText
            ]
        );
    }

    #[test]
    fn describe_never_leaks_text() {
        let hint = LocatorHint::new().text("secret keyword");
        assert_eq!(hint.describe(), "text");
        let hint = LocatorHint::new().alias("like_button").text("Like");
        assert_eq!(hint.describe(), "alias:like_button");
    }
}
