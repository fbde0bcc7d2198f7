use super::entities::DailyUsage;

/// In-memory collection of daily summaries. At most one entry per day, newest day first.
///
/// The store is a value: [UsageStore::merge] hands out a new store and leaves the old one
/// untouched, so readers holding a previous snapshot never observe a partial update.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct UsageStore {
    days: Vec<DailyUsage>,
}

impl UsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn days(&self) -> &[DailyUsage] {
        &self.days
    }

    pub fn get(&self, date_key: &str) -> Option<&DailyUsage> {
        self.days.iter().find(|v| v.date_key == date_key)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Replaces the entry for `day.date_key` (or adds it) and re-sorts by date, newest first.
    /// Keys are fixed width `YYYY-MM-DD`, so string order is date order.
    pub fn merge(&self, day: DailyUsage) -> UsageStore {
        let mut days = Vec::with_capacity(self.days.len() + 1);
        days.extend(
            self.days
                .iter()
                .filter(|v| v.date_key != day.date_key)
                .cloned(),
        );
        days.insert(0, day);
        days.sort_by(|a, b| b.date_key.cmp(&a.date_key));
        UsageStore { days }
    }
}

#[cfg(test)]
mod tests {
    use crate::usage::entities::{AppUsageEntry, DailyUsage};

    use super::UsageStore;

    fn day(date_key: &str, minutes: u64) -> DailyUsage {
        DailyUsage {
            date_key: date_key.into(),
            apps: vec![AppUsageEntry {
                package_name: "com.app".into(),
                minutes,
            }],
        }
    }

    fn keys(store: &UsageStore) -> Vec<&str> {
        store.days().iter().map(|v| v.date_key.as_str()).collect()
    }

    #[test]
    fn test_merge_orders_newest_first() {
        let store = UsageStore::new()
            .merge(day("2024-05-01", 1))
            .merge(day("2024-05-03", 1))
            .merge(day("2023-12-31", 1))
            .merge(day("2024-05-02", 1));

        assert_eq!(
            keys(&store),
            vec!["2024-05-03", "2024-05-02", "2024-05-01", "2023-12-31"]
        );
    }

    #[test]
    fn test_merge_replaces_same_day() {
        let store = UsageStore::new()
            .merge(day("2024-05-01", 1))
            .merge(day("2024-05-02", 1))
            .merge(day("2024-05-01", 7));

        assert_eq!(keys(&store), vec!["2024-05-02", "2024-05-01"]);
        assert_eq!(store.get("2024-05-01"), Some(&day("2024-05-01", 7)));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let store = UsageStore::new().merge(day("2024-05-02", 3));
        let once = store.merge(day("2024-05-01", 5));
        let twice = once.merge(day("2024-05-01", 5));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_leaves_input_untouched() {
        let store = UsageStore::new().merge(day("2024-05-01", 1));
        let snapshot = store.clone();

        let merged = store.merge(day("2024-05-01", 9));

        assert_eq!(store, snapshot);
        assert_ne!(merged, snapshot);
        assert!(UsageStore::new().is_empty());
    }
}
