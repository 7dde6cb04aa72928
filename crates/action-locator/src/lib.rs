//! Element location with layered fallback.
//!
//! Resolution order, first match wins:
//! - alias table lookup (CSS selectors maintained per logical control)
//! - ARIA role + accessible name
//! - fuzzy text containment with a randomised tie-break
//! - bounded scroll-and-rescan when nothing visible matched
//!
//! Exhaustion is not an error: the caller receives an empty [`Acquired`] and
//! decides whether the miss is fatal.

pub mod alias;
pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use alias::AliasTable;
pub use errors::LocatorError;
pub use resolver::{DefaultElementLocator, ElementLocator};
pub use strategies::{fuzzy_score, normalize_text, Strategy};
pub use types::{Acquired, Candidate, LocatorConfig, LocatorHint, LocatorStrategy};
