use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

const LOCAL_ENV_PATH: &str = "config/local.env";
const LOCAL_CONFIG_PATH: &str = "config/config.yaml";

/// Copy `config/local.env` entries into the process environment.
///
/// Keys that are already set are left alone.
pub fn load_local_env_overrides() {
    let path = Path::new(LOCAL_ENV_PATH);
    if !path.exists() {
        return;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            for (key, value) in parse_env_lines(&contents) {
                if env::var(&key).is_ok() {
                    continue;
                }
                env::set_var(key, value);
            }
            info!(path = %path.display(), "loaded environment overrides from local.env");
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read local.env overrides");
        }
    }
}

fn parse_env_lines(contents: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(line = idx + 1, "invalid local.env entry; skipping");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        entries.push((key.to_string(), unescape_value(value.trim())));
    }
    entries
}

/// Logs go to stderr so `--output json` stays machine readable.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
}

/// Resolve, read, override and validate the configuration.
///
/// Lookup order: the explicit path, `./config/config.yaml`, then
/// `<config dir>/waymark/config.yaml`. A missing file means defaults.
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config = AppConfig::from_yaml(&content)?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        AppConfig::default()
    };

    config.apply_env_overrides()?;
    config.validate()?;

    Ok(LoadedConfig {
        config,
        path: config_path,
    })
}

fn default_config_path() -> Result<PathBuf> {
    let local_config = PathBuf::from(LOCAL_CONFIG_PATH);
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("waymark");
    path.push("config.yaml");
    Ok(path)
}

fn unescape_value(value: &str) -> String {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        inner
            .replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\r", "\r")
            .replace("\\t", "\t")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use waymark_checkpoint_store::StoreBackend;

    #[test]
    fn env_lines_skip_comments_and_unquote() {
        let parsed = parse_env_lines(
            "# comment\n\nWAYMARK_STORE_ROOT=\"/var/lib/waymark\"\nbroken line\n =x\nRUST_LOG=debug\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("WAYMARK_STORE_ROOT".to_string(), "/var/lib/waymark".to_string()),
                ("RUST_LOG".to_string(), "debug".to_string()),
            ]
        );
    }

    #[test]
    fn quoted_values_keep_escapes() {
        assert_eq!(unescape_value("\"a\\tb\\\"c\""), "a\tb\"c");
        assert_eq!(unescape_value("plain"), "plain");
    }

    #[tokio::test]
    async fn explicit_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store:\n  backend: memory\ntap:\n  max_records_per_endpoint: 7").unwrap();

        let loaded = load_config(Some(&file.path().to_path_buf())).await.unwrap();
        assert_eq!(loaded.path, file.path());
        assert_eq!(loaded.config.store.backend, StoreBackend::Memory);
        assert_eq!(loaded.config.tap.max_records_per_endpoint, 7);
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded.config.flow, AppConfig::default().flow);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "flow: [not, a, map]").unwrap();
        assert!(load_config(Some(&file.path().to_path_buf())).await.is_err());
    }
}
