//! Alias table: logical control name -> ordered CSS selectors.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::LocatorError;

/// Maintained mapping from a logical alias (`like_button`, `search_box`) to
/// the selectors known to match it, most specific first.
///
/// ```yaml
/// like_button:
///   - "button[data-action=like]"
///   - ".note-actions .like"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    entries: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, LocatorError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|err| LocatorError::AliasTable(err.to_string()))
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, LocatorError> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|err| {
            LocatorError::AliasTable(format!("{}: {err}", path.as_ref().display()))
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Append a selector to an alias, skipping duplicates.
    pub fn insert(&mut self, alias: impl Into<String>, selector: impl Into<String>) {
        let selector = selector.into();
        let list = self.entries.entry(alias.into()).or_default();
        if !list.contains(&selector) {
            list.push(selector);
        }
    }

    /// Merge another table; its selectors go after the existing ones.
    pub fn merge(&mut self, other: AliasTable) {
        for (alias, selectors) in other.entries {
            for selector in selectors {
                self.insert(alias.clone(), selector);
            }
        }
    }

    pub fn selectors(&self, alias: &str) -> &[String] {
        self.entries.get(alias).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_and_merges_in_order() {
        let mut table = AliasTable::from_yaml_str(
            "like_button:\n  - \"button.like\"\n  - \"[aria-label=Like]\"\n",
        )
        .unwrap();
        let mut extra = AliasTable::new();
        extra.insert("like_button", "button.like");
        extra.insert("like_button", ".like-icon");
        extra.insert("search_box", "input[type=search]");
        table.merge(extra);

        assert_eq!(
            table.selectors("like_button"),
            ["button.like", "[aria-label=Like]", ".like-icon"]
        );
        assert_eq!(table.selectors("search_box"), ["input[type=search]"]);
        assert!(table.selectors("missing").is_empty());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn empty_and_invalid_yaml() {
        assert!(AliasTable::from_yaml_str("  ").unwrap().is_empty());
        assert!(matches!(
            AliasTable::from_yaml_str("- just\n- a list\n"),
            Err(LocatorError::AliasTable(_))
        ));
    }
}
