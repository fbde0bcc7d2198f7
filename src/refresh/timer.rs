use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

use super::Refresher;

/// Handle to a running periodic refresh. Dropping the handle stops the timer; a refresh that is
/// already talking to the bridge finishes, nothing starts afterwards.
pub struct RefreshTimer {
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshTimer {
    pub(super) fn start(refresher: Arc<Refresher>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(
            run_periodic(refresher, interval, shutdown.clone())
                .instrument(info_span!("periodic refresh")),
        );
        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Stops the timer and waits for the loop to exit.
    pub async fn cancel(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_periodic(refresher: Arc<Refresher>, interval: Duration, shutdown: CancellationToken) {
    let mut refresh_point = refresher.clock().instant();
    loop {
        refresh_point += interval;

        refresher.refresh_today().await;

        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Periodic refresh stopped");
                return
            }
            _ = refresher.clock().sleep_until(refresh_point) => ()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;

    use crate::{
        bridge::{Capability, MockUsageStatsProvider, Platform},
        refresh::{Refresher, DEFAULT_REFRESH_INTERVAL},
        usage::aggregator::UsageAggregator,
        utils::{clock::FixedClock, logging::TEST_LOGGING},
    };

    fn counting_refresher(calls: Arc<AtomicUsize>) -> Arc<Refresher> {
        let mut provider = MockUsageStatsProvider::new();
        provider.expect_query_usage().returning(move |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        });
        let platform = Platform {
            capability: Capability::Supported,
            provider: Arc::new(provider),
        };
        let (sender, _) = mpsc::unbounded_channel();
        Arc::new(Refresher::new(
            UsageAggregator::new(&platform),
            sender,
            Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_immediately_and_on_interval() {
        *TEST_LOGGING;
        let calls = Arc::new(AtomicUsize::new(0));
        let refresher = counting_refresher(calls.clone());

        let timer = refresher.start_periodic(DEFAULT_REFRESH_INTERVAL);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10 * 60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        timer.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_refreshing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let refresher = counting_refresher(calls.clone());

        let timer = refresher.start_periodic(DEFAULT_REFRESH_INTERVAL);
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(timer);

        tokio::time::sleep(Duration::from_secs(60 * 60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
