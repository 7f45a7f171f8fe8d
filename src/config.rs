use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::time::Duration;

use crate::services::parser::ParseMode;

fn default_max_file_size() -> usize {
    // 50 MB in bytes
    50 * 1024 * 1024
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

const DEFAULT_PREVIEW_ROWS: usize = 10;
const DEFAULT_PROGRESS_TICK_MS: u64 = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub preview_rows: usize,
    pub progress_tick: Duration,
    pub parse_mode: ParseMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_file_size: default_max_file_size(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            progress_tick: Duration::from_millis(DEFAULT_PROGRESS_TICK_MS),
            parse_mode: ParseMode::Naive,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Missing keys take their defaults,
    /// malformed ones are an error naming the key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(raw) = lookup("PREVIEW_BIND_ADDR") {
            config.bind_addr = raw
                .trim()
                .parse()
                .with_context(|| format!("PREVIEW_BIND_ADDR is not a socket address: {}", raw))?;
        }

        if let Some(raw) = lookup("MAX_FILE_SIZE") {
            config.max_file_size = raw
                .trim()
                .parse()
                .with_context(|| format!("MAX_FILE_SIZE is not a byte count: {}", raw))?;
        }

        if let Some(raw) = lookup("PREVIEW_ROWS") {
            let rows: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("PREVIEW_ROWS is not a number: {}", raw))?;
            if rows == 0 {
                anyhow::bail!("PREVIEW_ROWS must be at least 1");
            }
            config.preview_rows = rows;
        }

        if let Some(raw) = lookup("PROGRESS_TICK_MS") {
            let millis: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("PROGRESS_TICK_MS is not a number: {}", raw))?;
            if millis == 0 {
                anyhow::bail!("PROGRESS_TICK_MS must be at least 1");
            }
            config.progress_tick = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("CSV_PARSE_MODE") {
            config.parse_mode = raw
                .parse()
                .with_context(|| format!("CSV_PARSE_MODE is invalid: {}", raw))?;
        }

        Ok(config)
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::new()?;
    tracing::info!(
        "Loaded config: bind={}, max_file_size={}B, preview_rows={}, tick={:?}, parse_mode={:?}",
        config.bind_addr,
        config.max_file_size,
        config.preview_rows,
        config.progress_tick,
        config.parse_mode
    );
    Ok(config)
}
