//! # Configuration
//!
//! Settings resolve as defaults → config file → env vars. The file lives at
//! `<config dir>/nav-nexus/config.toml` unless a path is given; a missing
//! file simply means defaults.

use crate::error::{ParseConfigSnafu, ReadConfigSnafu};
use crate::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// File layout (all fields optional so the TOML can be sparse)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NexusConfig {
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default)]
    pub toolkit: ToolkitSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RouterSection {
    pub animated: Option<bool>,
    pub transition_timeout_ms: Option<u64>,
    pub on_violation: Option<ViolationPolicy>,
    pub overlap: Option<OverlapPolicy>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ToolkitSection {
    pub animation_ms: Option<u64>,
}

/// What the router does when the route tree asks for a transition the
/// adapter chain cannot perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    /// Return the error to the caller.
    #[default]
    Report,
    /// Log it and panic.
    Abort,
}

/// What the router driver does with a request that arrives while another
/// transition is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Run it after the pending ones, diffed against the tree they leave.
    #[default]
    Queue,
    /// Refuse it with `TransitionInFlight`.
    Reject,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_TRANSITION_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_ANIMATION_MS: u64 = 250;

const ENV_TRANSITION_TIMEOUT_MS: &str = "NAV_NEXUS_TRANSITION_TIMEOUT_MS";
const ENV_ANIMATION_MS: &str = "NAV_NEXUS_ANIMATION_MS";

// ============================================================================
// Resolved config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Animation flag used when a request does not specify one.
    pub animated: bool,
    /// Upper bound on a single routing step; `None` waits forever.
    pub transition_timeout: Option<Duration>,
    pub on_violation: ViolationPolicy,
    pub overlap: OverlapPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            animated: true,
            transition_timeout: Some(Duration::from_millis(DEFAULT_TRANSITION_TIMEOUT_MS)),
            on_violation: ViolationPolicy::default(),
            overlap: OverlapPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub router: RouterConfig,
    pub animation: Duration,
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `<config dir>/nav-nexus/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nav-nexus").join("config.toml"))
}

/// Load the config at `path`, or at [`config_path`] when `path` is `None`.
///
/// A file that does not exist yields the defaults; a file that exists but
/// cannot be read or parsed is an error.
pub fn load_config(path: Option<&Path>) -> Result<NexusConfig> {
    let path = match path.map(Path::to_path_buf).or_else(config_path) {
        Some(p) => p,
        None => {
            info!("No config directory available, using defaults");
            return Ok(NexusConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(NexusConfig::default());
    }

    let contents = fs::read_to_string(&path).context(ReadConfigSnafu { path: path.clone() })?;
    let config = parse_config_at(&path, &contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Parse config text.
pub fn parse_config(contents: &str) -> std::result::Result<NexusConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Parse config text that came from `path`, for error reporting.
pub fn parse_config_at(path: &Path, contents: &str) -> Result<NexusConfig> {
    toml::from_str(contents).context(ParseConfigSnafu { path })
}

// ============================================================================
// Resolution
// ============================================================================

/// Collapse defaults → config file → env vars into concrete values.
pub fn resolve(config: &NexusConfig) -> ResolvedConfig {
    resolve_with_env(config, |key| std::env::var(key).ok())
}

fn resolve_with_env<F>(config: &NexusConfig, env: F) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    let env_ms = |key: &str| env(key).and_then(|v| v.trim().parse::<u64>().ok());

    // 0 disables the timeout.
    let timeout_ms = env_ms(ENV_TRANSITION_TIMEOUT_MS)
        .or(config.router.transition_timeout_ms)
        .unwrap_or(DEFAULT_TRANSITION_TIMEOUT_MS);

    let animation_ms = env_ms(ENV_ANIMATION_MS)
        .or(config.toolkit.animation_ms)
        .unwrap_or(DEFAULT_ANIMATION_MS);

    ResolvedConfig {
        router: RouterConfig {
            animated: config.router.animated.unwrap_or(true),
            transition_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            on_violation: config.router.on_violation.unwrap_or_default(),
            overlap: config.router.overlap.unwrap_or_default(),
        },
        animation: Duration::from_millis(animation_ms),
    }
}
