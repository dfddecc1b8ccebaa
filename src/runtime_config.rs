//! # Runtime Configuration Module
//!
//! Settings for the coroutine runtime and the server.
//!
//! ## Sources
//!
//! Lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. an optional YAML file (every key optional)
//! 3. environment variables
//!
//! A malformed environment value is ignored and the lower-precedence value
//! stays in effect.
//!
//! ## Environment Variables
//!
//! ### `AGI_STACK_SIZE`
//!
//! Stack size of each call coroutine. Decimal (`16384`) or hexadecimal
//! (`0x4000`). Default: `0x4000` (16 KB). Total memory grows with
//! `stack_size × concurrent calls`.
//!
//! ### `AGI_WORKERS`
//!
//! Number of `may` worker threads. `1` runs every call on one thread,
//! cooperatively. Default: `1`.
//!
//! ### `AGI_RAISE_ON_ERROR`
//!
//! `true` raises backend failures into handlers as errors; `false` (default)
//! logs them and returns the failure response.
//!
//! ### `AGI_BIND_ADDR`
//!
//! Listen address. Default: `127.0.0.1:4574`.
//!
//! ## Example
//!
//! ```yaml
//! stack_size: 0x8000
//! workers: 4
//! raise_on_error: true
//! bind_addr: 0.0.0.0:4574
//! ```
//!
//! ```rust
//! use agirouter::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! assert!(config.stack_size > 0);
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::env;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4574";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for call coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    /// `may` worker threads
    pub workers: usize,
    /// Raise backend failures into handlers
    pub raise_on_error: bool,
    /// Listen address
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            workers: DEFAULT_WORKERS,
            raise_on_error: false,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

/// Parse a size in decimal or `0x` hexadecimal.
#[must_use]
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Number(usize),
    Text(String),
}

fn deserialize_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    match Option::<SizeRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SizeRepr::Number(n)) => Ok(Some(n)),
        Some(SizeRepr::Text(s)) => parse_size(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size: {s}"))),
    }
}

/// On-disk form; every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default, deserialize_with = "deserialize_size")]
    stack_size: Option<usize>,
    workers: Option<usize>,
    raise_on_error: Option<bool>,
    bind_addr: Option<String>,
}

impl RuntimeConfig {
    /// Defaults overridden by environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_lookup(|key| env::var(key).ok())
    }

    /// Defaults, then the YAML file at `path`, then environment variables.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            config = config.with_yaml(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?;
        }
        Ok(config.with_lookup(|key| env::var(key).ok()))
    }

    /// Overlay the keys present in a YAML document.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML, unknown keys or invalid values.
    pub fn with_yaml(mut self, text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(self);
        }
        let file: Option<FileConfig> = serde_yaml::from_str(text)?;
        let file = file.unwrap_or_default();
        if let Some(v) = file.stack_size {
            self.stack_size = v;
        }
        if let Some(v) = file.workers {
            self.workers = v;
        }
        if let Some(v) = file.raise_on_error {
            self.raise_on_error = v;
        }
        if let Some(v) = file.bind_addr {
            self.bind_addr = v;
        }
        Ok(self)
    }

    pub(crate) fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("AGI_STACK_SIZE") {
            match parse_size(&val) {
                Some(size) if size > 0 => self.stack_size = size,
                _ => warn!(value = %val, "Ignoring invalid AGI_STACK_SIZE"),
            }
        }
        if let Some(val) = lookup("AGI_WORKERS") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.workers = n,
                _ => warn!(value = %val, "Ignoring invalid AGI_WORKERS"),
            }
        }
        if let Some(val) = lookup("AGI_RAISE_ON_ERROR") {
            match parse_bool(&val) {
                Some(b) => self.raise_on_error = b,
                None => warn!(value = %val, "Ignoring invalid AGI_RAISE_ON_ERROR"),
            }
        }
        if let Some(val) = lookup("AGI_BIND_ADDR") {
            if val.trim().is_empty() {
                warn!("Ignoring empty AGI_BIND_ADDR");
            } else {
                self.bind_addr = val.trim().to_string();
            }
        }
        self
    }

    /// Push stack size and worker count into the global `may` config.
    ///
    /// Call before the first coroutine is spawned.
    pub fn apply_to_runtime(&self) {
        may::config()
            .set_stack_size(self.stack_size)
            .set_workers(self.workers);
    }
}
