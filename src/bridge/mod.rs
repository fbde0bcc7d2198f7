//! Contains the boundary to the platform usage statistics service.
//! [Platform] is the main artifact of this module: it resolves once, at startup, whether the
//! current platform can answer usage queries and which [UsageStatsProvider] answers them.

pub mod command;

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use command::CommandProvider;

/// Raw record produced by the platform. Only lives for the duration of a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    /// Package identifier of the application. For example 'com.android.chrome'
    pub package_name: Arc<str>,
    /// Total foreground time of the application in the bucket the OS picked for the query.
    pub foreground_millis: i64,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The statistics service could not be reached at all.
    #[error("usage statistics service is unavailable: {0}")]
    Unavailable(String),
    /// The usage access settings screen could not be presented.
    #[error("could not open usage access settings: {0}")]
    ActivityUnavailable(String),
    /// The service was reached but the query failed.
    #[error("usage statistics query failed: {0}")]
    UsageStats(String),
}

/// Intended to serve as a contract every platform usage statistics service must implement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsageStatsProvider: Send + Sync {
    /// Returns foreground usage per application for the closed window `[start, end]`.
    ///
    /// The OS answers with its own best matching bucket, so totals may cover slightly more or less
    /// than the requested window.
    async fn query_usage(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>, BridgeError>;

    /// Asks the OS to present the screen where usage access can be granted.
    async fn open_settings(&self) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Supported,
    Unsupported,
}

/// Provider used on platforms without a usage statistics service.
pub struct UnsupportedProvider;

#[async_trait]
impl UsageStatsProvider for UnsupportedProvider {
    async fn query_usage(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>, BridgeError> {
        Ok(vec![])
    }

    async fn open_settings(&self) -> Result<(), BridgeError> {
        Err(BridgeError::ActivityUnavailable(
            "platform has no usage access settings".into(),
        ))
    }
}

/// Name of the helper looked up in `PATH` on Android when no bridge is configured.
pub const DEFAULT_ANDROID_BRIDGE: &str = "usage-bridge";

#[derive(Clone)]
pub struct Platform {
    pub capability: Capability,
    pub provider: Arc<dyn UsageStatsProvider>,
}

impl Platform {
    /// Resolves the platform capability. An explicitly configured bridge always wins over the
    /// platform default.
    pub fn detect(bridge: Option<PathBuf>, bridge_args: Vec<String>) -> Self {
        match bridge.or_else(default_bridge) {
            Some(program) => {
                info!("Using usage bridge {program:?} {bridge_args:?}");
                Self {
                    capability: Capability::Supported,
                    provider: Arc::new(CommandProvider::new(program, bridge_args)),
                }
            }
            None => {
                info!("No usage statistics service on this platform");
                Self::unsupported()
            }
        }
    }

    pub fn unsupported() -> Self {
        Self {
            capability: Capability::Unsupported,
            provider: Arc::new(UnsupportedProvider),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.capability == Capability::Supported
    }
}

fn default_bridge() -> Option<PathBuf> {
    if cfg!(target_os = "android") {
        Some(PathBuf::from(DEFAULT_ANDROID_BRIDGE))
    } else {
        None
    }
}
