// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use probeview_app::Column;
use probeview_tui::DEFAULT_PANEL_HEIGHT;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "probeview";
pub const CONFIG_PATH_ENV: &str = "PROBEVIEW_CONFIG_PATH";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";
const MIN_PANEL_HEIGHT: i64 = 6;
const MAX_PANEL_HEIGHT: i64 = 40;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub panel_height: Option<i64>,
    pub initial_sort: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and keep values under [ui] and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(height) = self.ui.panel_height
            && !(MIN_PANEL_HEIGHT..=MAX_PANEL_HEIGHT).contains(&height)
        {
            bail!(
                "ui.panel_height in {} must be between {} and {}, got {}",
                path.display(),
                MIN_PANEL_HEIGHT,
                MAX_PANEL_HEIGHT,
                height
            );
        }

        if let Some(sort) = &self.ui.initial_sort
            && Column::parse(sort).is_none()
        {
            bail!(
                "ui.initial_sort in {} must name a column (host, title, status_code, technologies), got {:?}",
                path.display(),
                sort
            );
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).map_err(|error| {
                anyhow!(
                    "log.level in {} is not a valid filter {:?}: {}",
                    path.display(),
                    level,
                    error
                )
            })?;
        }

        Ok(())
    }

    pub fn panel_height(&self) -> u16 {
        self.ui
            .panel_height
            .and_then(|height| u16::try_from(height).ok())
            .unwrap_or(DEFAULT_PANEL_HEIGHT)
    }

    pub fn initial_sort(&self) -> Option<Column> {
        self.ui.initial_sort.as_deref().and_then(Column::parse)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_deref().map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# probeview config\n# Place this file at: {}\n\nversion = 1\n\n[ui]\n# Rows reserved for the filter and sort panels ({}-{}).\npanel_height = {}\n# Optional. Column to sort by on startup: host, title, status_code, technologies.\n# initial_sort = \"status_code\"\n\n[log]\n# tracing filter; {} overrides it.\nlevel = \"{}\"\n# Optional. Interactive sessions only log when this is set.\n# file = \"/tmp/probeview.log\"\n",
            path.display(),
            MIN_PANEL_HEIGHT,
            MAX_PANEL_HEIGHT,
            DEFAULT_PANEL_HEIGHT,
            crate::logging::LOG_ENV,
            DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config};
    use anyhow::Result;
    use probeview_app::Column;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.panel_height(), 12);
        assert_eq!(config.initial_sort(), None);
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_file(), None);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[ui]\npanel_height = 10\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[ui] and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[ui]\npanel_height = 8\ninitial_sort = \"Status\"\n[log]\nlevel = \"probeview=debug\"\nfile = \"/tmp/probeview.log\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.panel_height(), 8);
        assert_eq!(config.initial_sort(), Some(Column::StatusCode));
        assert_eq!(config.log_level(), "probeview=debug");
        assert_eq!(config.log_file(), Some(PathBuf::from("/tmp/probeview.log")));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 3\n")?;
        let error = Config::load(&path).expect_err("v3 config should fail");
        assert!(error.to_string().contains("unsupported config version 3"));
        Ok(())
    }

    #[test]
    fn panel_height_out_of_range_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\npanel_height = 2\n")?;
        let error = Config::load(&path).expect_err("tiny panel should fail");
        let message = error.to_string();
        assert!(message.contains("ui.panel_height"));
        assert!(message.contains("between 6 and 40"));
        Ok(())
    }

    #[test]
    fn unknown_initial_sort_column_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\ninitial_sort = \"ports\"\n")?;
        let error = Config::load(&path).expect_err("unknown column should fail");
        assert!(error.to_string().contains("ui.initial_sort"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"probeview=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad level should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("probeview/config.toml"));
        Ok(())
    }

    #[test]
    fn example_config_loads_cleanly() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[ui]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.panel_height(), 12);
        Ok(())
    }
}
