// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PROBEVIEW_LOG";

/// Builds the event filter. A non-empty `PROBEVIEW_LOG` wins over the
/// configured level.
pub fn log_filter(env_value: Option<&str>, configured: &str) -> Result<EnvFilter> {
    match env_value.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => {
            EnvFilter::try_new(raw).with_context(|| format!("invalid {LOG_ENV} filter {raw:?}"))
        }
        None => EnvFilter::try_new(configured)
            .with_context(|| format!("invalid log level {configured:?}")),
    }
}

/// Installs the global subscriber. The interactive UI owns the terminal, so
/// without a log file an interactive session installs nothing.
pub fn init(config: &Config, interactive: bool) -> Result<()> {
    let env_value = env::var(LOG_ENV).ok();
    let filter = log_filter(env_value.as_deref(), config.log_level())?;

    let installed = match config.log_file() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| {
                    format!(
                        "open log file {}; fix [log].file or remove it",
                        path.display()
                    )
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None if interactive => return Ok(()),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init(),
    };
    installed.map_err(|error| anyhow!("install log subscriber: {error}"))
}
