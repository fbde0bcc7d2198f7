use std::sync::Arc;

use serde::Serialize;

/// Foreground time of a single application, rounded to minutes.
#[derive(PartialEq, Eq, Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AppUsageEntry {
    pub package_name: Arc<str>,
    pub minutes: u64,
}

/// Usage of a single local calendar day. `apps` is ordered by minutes, most used first.
#[derive(PartialEq, Eq, Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    /// `YYYY-MM-DD` of the day start in local time.
    pub date_key: String,
    pub apps: Vec<AppUsageEntry>,
}

impl DailyUsage {
    pub fn empty(date_key: String) -> Self {
        Self {
            date_key,
            apps: vec![],
        }
    }
}
