use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use waymark_checkpoint_store::{open_store, CheckpointStore};

use crate::cli::output::OutputFormat;
use crate::config::AppConfig;

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Opens the backend named by `store` in the configuration.
    pub fn store(&self) -> Result<Arc<dyn CheckpointStore>> {
        open_store(&self.config.store).with_context(|| {
            format!(
                "failed to open checkpoint store at {}",
                self.config.store.root.display()
            )
        })
    }
}
