//! Durable per-day play counter.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Datelike;
use game_core::{CalendarDate, DailyQuota};
use serde::{Deserialize, Serialize};

use super::{DateSource, KeyValueStore, Result};

/// Stored layout of the quota slot: `{"date": "2026-1-5", "count": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub date: String,
    pub count: u32,
}

impl From<DailyQuota> for QuotaRecord {
    fn from(quota: DailyQuota) -> Self {
        Self {
            date: quota.date.to_string(),
            count: quota.plays_used,
        }
    }
}

/// Reads the host's local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDateSource;

impl DateSource for LocalDateSource {
    fn today(&self) -> CalendarDate {
        let now = chrono::Local::now().date_naive();
        CalendarDate::new(now.year(), now.month(), now.day())
    }
}

/// Date source that only moves when told to.
#[derive(Debug)]
pub struct FixedDateSource {
    date: Mutex<CalendarDate>,
}

impl FixedDateSource {
    pub fn new(date: CalendarDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    pub fn set(&self, date: CalendarDate) {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner) = date;
    }
}

impl DateSource for FixedDateSource {
    fn today(&self) -> CalendarDate {
        *self.date.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Play quota persisted in a single key/value slot.
///
/// A record from an earlier day, a missing record and an unreadable record
/// all read as zero plays for today.
#[derive(Clone)]
pub struct PersistentQuotaStore {
    store: Arc<dyn KeyValueStore>,
    dates: Arc<dyn DateSource>,
    key: String,
}

impl PersistentQuotaStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        dates: Arc<dyn DateSource>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dates,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Today's record, written back when it had to be reset.
    pub fn today(&self) -> Result<DailyQuota> {
        let today = self.dates.today();
        let stored = self.load()?;
        let quota = stored
            .map(|quota| quota.for_day(today))
            .unwrap_or_else(|| DailyQuota::fresh(today));
        if stored != Some(quota) {
            self.save(quota)?;
        }
        Ok(quota)
    }

    /// Records one concluded run and persists it.
    pub fn increment(&self) -> Result<DailyQuota> {
        let quota = self.today()?.record_play();
        self.save(quota)?;
        tracing::debug!(date = %quota.date, plays = quota.plays_used, "quota incremented");
        Ok(quota)
    }

    fn load(&self) -> Result<Option<DailyQuota>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        let parsed = serde_json::from_str::<QuotaRecord>(&raw)
            .ok()
            .and_then(|record| {
                let date = record.date.parse::<CalendarDate>().ok()?;
                Some(DailyQuota {
                    date,
                    plays_used: record.count,
                })
            });
        if parsed.is_none() {
            tracing::warn!(key = %self.key, "unreadable quota record, starting fresh");
        }
        Ok(parsed)
    }

    fn save(&self, quota: DailyQuota) -> Result<()> {
        let raw = serde_json::to_string(&QuotaRecord::from(quota))?;
        self.store.set(&self.key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;

    const KEY: &str = "pharos_game_plays";

    fn quota_store(
        date: CalendarDate,
    ) -> (PersistentQuotaStore, Arc<InMemoryStore>, Arc<FixedDateSource>) {
        let store = Arc::new(InMemoryStore::new());
        let dates = Arc::new(FixedDateSource::new(date));
        let quota = PersistentQuotaStore::new(store.clone(), dates.clone(), KEY);
        (quota, store, dates)
    }

    #[test]
    fn creates_zeroed_record_for_today() {
        let day = CalendarDate::new(2026, 1, 5);
        let (quota, store, _) = quota_store(day);

        assert_eq!(quota.today().unwrap(), DailyQuota::fresh(day));
        assert_eq!(
            store.get(KEY).unwrap().as_deref(),
            Some(r#"{"date":"2026-1-5","count":0}"#)
        );
    }

    #[test]
    fn same_day_round_trip_keeps_count() {
        let day = CalendarDate::new(2026, 10, 18);
        let (quota, store, dates) = quota_store(day);
        quota.increment().unwrap();
        quota.increment().unwrap();

        let reopened = PersistentQuotaStore::new(store, dates, KEY);
        assert_eq!(reopened.today().unwrap().plays_used, 2);
    }

    #[test]
    fn rollover_resets_count() {
        let (quota, _, dates) = quota_store(CalendarDate::new(2026, 10, 18));
        quota.increment().unwrap();

        let tomorrow = CalendarDate::new(2026, 10, 19);
        dates.set(tomorrow);
        assert_eq!(quota.today().unwrap(), DailyQuota::fresh(tomorrow));
    }

    #[test]
    fn reads_zero_padded_dates_written_by_other_hosts() {
        let (quota, store, _) = quota_store(CalendarDate::new(2026, 1, 5));
        store.set(KEY, r#"{"date":"2026-01-05","count":1}"#).unwrap();
        assert_eq!(quota.today().unwrap().plays_used, 1);
    }

    #[test]
    fn garbage_record_reads_as_fresh() {
        let day = CalendarDate::new(2026, 1, 5);
        let (quota, store, _) = quota_store(day);
        store.set(KEY, "not json").unwrap();
        assert_eq!(quota.increment().unwrap(), DailyQuota { date: day, plays_used: 1 });
    }
}
