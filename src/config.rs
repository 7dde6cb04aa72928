use std::env;
use std::path::PathBuf;

use action_locator::LocatorConfig;
use anyhow::{Context, Result};
use confirm_tap::TapConfig;
use operation_flow::FlowConfig;
use serde::{Deserialize, Serialize};
use tool_click::ClickPolicyView;
use tracing::{info, warn};
use waymark_checkpoint_store::StorePolicyView;

pub const ENV_STORE_ROOT: &str = "WAYMARK_STORE_ROOT";
pub const ENV_SCRIPTED_DISPATCH: &str = "WAYMARK_SCRIPTED_DISPATCH";

/// Every component's policy view, as read from `config.yaml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StorePolicyView,
    pub locator: LocatorConfig,
    pub click: ClickPolicyView,
    pub tap: TapConfig,
    pub flow: FlowConfig,
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Environment wins over the file for the keys it names.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(root) = env::var(ENV_STORE_ROOT) {
            if !root.trim().is_empty() {
                info!(root = %root, "checkpoint root overridden from environment");
                self.store.root = PathBuf::from(root.trim());
            }
        }
        if let Ok(raw) = env::var(ENV_SCRIPTED_DISPATCH) {
            let enabled = parse_bool(&raw)
                .with_context(|| format!("{ENV_SCRIPTED_DISPATCH} must be a boolean, got {raw:?}"))?;
            if enabled {
                warn!("scripted click dispatch enabled from environment");
            }
            self.click.scripted_dispatch_enabled = enabled;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.click.validate().context("invalid click settings")?;
        self.flow.validate().context("invalid flow settings")?;
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_checkpoint_store::StoreBackend;

    #[test]
    fn partial_yaml_keeps_component_defaults() {
        let yaml = r#"
store:
  backend: memory
flow:
  max_attempts: 2
click:
  trajectory:
    min_steps: 12
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.max_history_per_op, StorePolicyView::default().max_history_per_op);
        assert_eq!(config.flow.max_attempts, 2);
        assert_eq!(config.flow.confirm_timeout_ms, FlowConfig::default().confirm_timeout_ms);
        assert_eq!(config.click.trajectory.min_steps, 12);
        assert!(!config.click.scripted_dispatch_enabled);
        assert_eq!(config.tap, TapConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn invalid_flow_settings_are_rejected() {
        let config = AppConfig::from_yaml("flow:\n  max_attempts: 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
