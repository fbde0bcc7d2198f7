use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use tracing::{debug, instrument};

use crate::{
    bridge::{BridgeError, Capability, Platform, UsageRecord, UsageStatsProvider},
    utils::time::{date_to_key, day_window},
};

use super::entities::{AppUsageEntry, DailyUsage};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Builds a [DailyUsage] for a calendar day out of a single bridge query.
pub struct UsageAggregator<Tz = Local> {
    provider: Arc<dyn UsageStatsProvider>,
    capability: Capability,
    timezone: Tz,
}

impl UsageAggregator<Local> {
    pub fn new(platform: &Platform) -> Self {
        Self::with_timezone(platform, Local)
    }
}

impl<Tz: TimeZone> UsageAggregator<Tz> {
    pub fn with_timezone(platform: &Platform, timezone: Tz) -> Self {
        Self {
            provider: platform.provider.clone(),
            capability: platform.capability,
            timezone,
        }
    }

    /// Queries usage between the day's midnight and 23:59:59.999. Bridge errors are returned
    /// as is; a platform without the capability gets an empty day without touching the bridge.
    #[instrument(skip(self))]
    pub async fn aggregate_day(&self, date: NaiveDate) -> Result<DailyUsage, BridgeError> {
        let (date_key, start, end) = {
            let (start, end) = day_window(date, &self.timezone);
            (
                date_to_key(start.date_naive()),
                start.with_timezone(&Utc),
                end.with_timezone(&Utc),
            )
        };

        if self.capability == Capability::Unsupported {
            debug!("Usage statistics unsupported, {date_key} stays empty");
            return Ok(DailyUsage::empty(date_key));
        }

        let records = self.provider.query_usage(start, end).await?;
        debug!("Bridge returned {} records for {date_key}", records.len());

        Ok(DailyUsage {
            date_key,
            apps: summarize(records),
        })
    }
}

/// Drops records without foreground time or name and rounds the rest to minutes, most used
/// first. Equal minutes keep the order the bridge returned them in.
pub fn summarize(records: impl IntoIterator<Item = UsageRecord>) -> Vec<AppUsageEntry> {
    let mut apps = records
        .into_iter()
        .filter(|v| v.foreground_millis > 0 && !v.package_name.is_empty())
        .map(|v| AppUsageEntry {
            package_name: v.package_name,
            minutes: to_minutes(v.foreground_millis),
        })
        .collect::<Vec<_>>();
    apps.sort_by(|a, b| b.minutes.cmp(&a.minutes));
    apps
}

/// Rounds half up. Only called with positive values.
fn to_minutes(foreground_millis: i64) -> u64 {
    (foreground_millis.saturating_add(MILLIS_PER_MINUTE / 2) / MILLIS_PER_MINUTE) as u64
}
