//! Keeps "today" up to date. [Refresher] runs aggregate-then-merge for the current day and
//! [timer::RefreshTimer] repeats it on a fixed interval for as long as its handle is alive.

pub mod timer;

use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use crate::{
    usage::{aggregator::UsageAggregator, store::UsageStore},
    utils::{clock::Clock, time::date_to_key},
};

use timer::RefreshTimer;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Error,
    Info,
}

/// Message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Info,
            message: message.into(),
        }
    }
}

/// Aggregates today's usage and publishes the merged store.
///
/// The store is only ever replaced as a whole. Overlapping refreshes each merge their own
/// result when they finish, the last one to finish wins.
pub struct Refresher {
    aggregator: UsageAggregator,
    store: watch::Sender<UsageStore>,
    alerts: mpsc::UnboundedSender<Alert>,
    clock: Box<dyn Clock>,
}

impl Refresher {
    pub fn new(
        aggregator: UsageAggregator,
        alerts: mpsc::UnboundedSender<Alert>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let (store, _) = watch::channel(UsageStore::new());
        Self {
            aggregator,
            store,
            alerts,
            clock,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UsageStore> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> UsageStore {
        self.store.borrow().clone()
    }

    /// Returns whether the store was updated. Failures are reported through the alert channel
    /// and leave the store as it was.
    pub async fn refresh_today(&self) -> bool {
        let today = self.clock.today();
        match self.aggregator.aggregate_day(today).await {
            Ok(day) => {
                info!("Refreshed {} with {} apps", day.date_key, day.apps.len());
                self.store.send_modify(|store| *store = store.merge(day));
                true
            }
            Err(e) => {
                error!("Failed to refresh usage for {today}: {e}");
                if self.alerts.send(Alert::error(e.to_string())).is_err() {
                    error!("Nobody is listening for alerts");
                }
                false
            }
        }
    }

    /// Refreshes right away and then every `interval` until the returned handle is dropped.
    pub fn start_periodic(self: &Arc<Self>, interval: Duration) -> RefreshTimer {
        RefreshTimer::start(self.clone(), interval)
    }

    /// Date key of the day [Refresher::refresh_today] would refresh right now.
    pub fn today_key(&self) -> String {
        date_to_key(self.clock.today())
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;

    use crate::{
        bridge::{BridgeError, Capability, MockUsageStatsProvider, Platform, UsageRecord},
        usage::aggregator::UsageAggregator,
        utils::{clock::FixedClock, logging::TEST_LOGGING},
    };

    use super::{Alert, AlertKind, Refresher};

    fn refresher(
        provider: MockUsageStatsProvider,
        capability: Capability,
    ) -> (Refresher, mpsc::UnboundedReceiver<Alert>) {
        let platform = Platform {
            capability,
            provider: Arc::new(provider),
        };
        let (sender, receiver) = mpsc::unbounded_channel();
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        (
            Refresher::new(UsageAggregator::new(&platform), sender, Box::new(clock)),
            receiver,
        )
    }

    #[tokio::test]
    async fn test_refresh_today_merges_into_store() {
        *TEST_LOGGING;
        let mut provider = MockUsageStatsProvider::new();
        provider.expect_query_usage().times(2).returning(|_, _| {
            Ok(vec![UsageRecord {
                package_name: "com.app".into(),
                foreground_millis: 60_000,
            }])
        });
        let (refresher, mut alerts) = refresher(provider, Capability::Supported);
        let updates = refresher.subscribe();

        assert!(refresher.refresh_today().await);
        assert!(updates.has_changed().unwrap());
        assert!(refresher.refresh_today().await);

        let store = refresher.snapshot();
        assert_eq!(store.days().len(), 1);
        assert_eq!(store.days()[0].apps[0].minutes, 1);
        assert!(alerts.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_store_and_alerts() {
        *TEST_LOGGING;
        let mut calls = 0;
        let mut provider = MockUsageStatsProvider::new();
        provider.expect_query_usage().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Ok(vec![])
            } else {
                Err(BridgeError::UsageStats("service died".into()))
            }
        });
        let (refresher, mut alerts) = refresher(provider, Capability::Supported);

        assert!(refresher.refresh_today().await);
        let before = refresher.snapshot();

        assert!(!refresher.refresh_today().await);

        assert_eq!(refresher.snapshot(), before);
        let alert = alerts.try_recv().unwrap();
        assert_eq!(alert.kind, AlertKind::Error);
        assert!(alert.message.contains("service died"));
    }

    #[tokio::test]
    async fn test_refresh_without_capability_adds_empty_day() {
        let mut provider = MockUsageStatsProvider::new();
        provider.expect_query_usage().never();
        let (refresher, _alerts) = refresher(provider, Capability::Unsupported);

        assert!(refresher.refresh_today().await);

        let store = refresher.snapshot();
        assert_eq!(store.days().len(), 1);
        assert!(store.days()[0].apps.is_empty());
    }
}
