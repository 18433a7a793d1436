//! Period clock and append-or-patch aggregation

use super::{AppendOutcome, PeriodRecord};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length of one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Keyed `YYYY-MM-DD`
    Day,
    /// Keyed `YYYY-MM-DDTHH`
    Hour,
}

/// Maps instants to period keys in a fixed reporting offset.
///
/// Keys sort lexicographically in time order.
#[derive(Debug, Clone, Copy)]
pub struct PeriodClock {
    offset: FixedOffset,
    granularity: Granularity,
}

impl PeriodClock {
    pub fn new(offset: FixedOffset, granularity: Granularity) -> Self {
        Self {
            offset,
            granularity,
        }
    }

    /// Clock at a whole-hour offset from UTC; `None` when out of range
    pub fn from_hours(utc_offset_hours: i32, granularity: Granularity) -> Option<Self> {
        FixedOffset::east_opt(utc_offset_hours.checked_mul(3600)?)
            .map(|offset| Self::new(offset, granularity))
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn key_for(&self, instant: DateTime<Utc>) -> String {
        let local = instant.with_timezone(&self.offset);
        match self.granularity {
            Granularity::Day => local.format("%Y-%m-%d").to_string(),
            Granularity::Hour => local.format("%Y-%m-%dT%H").to_string(),
        }
    }

    /// Day key of the period containing `instant`, whatever the granularity
    pub fn day_key_for(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// A period is open while `now` still falls inside it
    pub fn is_open(&self, key: &str, now: DateTime<Utc>) -> bool {
        self.key_for(now) == key
    }
}

/// Appends snapshots to a period log, one record per period.
///
/// The record for the open period is overwritten by later snapshots. Records
/// for closed periods are never modified.
#[derive(Debug, Clone)]
pub struct PeriodAggregator {
    clock: PeriodClock,
    retention: Option<usize>,
}

impl PeriodAggregator {
    pub fn new(clock: PeriodClock) -> Self {
        Self {
            clock,
            retention: None,
        }
    }

    /// Keep at most `records` entries, dropping the oldest
    pub fn with_retention(mut self, records: usize) -> Self {
        self.retention = Some(records);
        self
    }

    pub fn clock(&self) -> &PeriodClock {
        &self.clock
    }

    /// Record a snapshot for the period containing `now`
    pub fn record(
        &self,
        log: &mut Vec<PeriodRecord>,
        snapshot: BTreeMap<String, Decimal>,
        now: DateTime<Utc>,
    ) -> AppendOutcome {
        let key = self.clock.key_for(now);
        self.append_or_patch(log, &key, snapshot, now)
    }

    /// Insert or overwrite the record for `key`, keeping the log ascending
    pub fn append_or_patch(
        &self,
        log: &mut Vec<PeriodRecord>,
        key: &str,
        snapshot: BTreeMap<String, Decimal>,
        now: DateTime<Utc>,
    ) -> AppendOutcome {
        let mut record = PeriodRecord::new(key, snapshot);
        record.logged_at = Some(now);

        let outcome = match log.iter().position(|r| r.period_key == key) {
            Some(index) if self.clock.is_open(key, now) => {
                log[index] = record;
                AppendOutcome::Patched
            }
            Some(_) => AppendOutcome::Unchanged,
            None => {
                let index = log.partition_point(|r| r.period_key.as_str() < key);
                log.insert(index, record);
                AppendOutcome::Appended
            }
        };

        if let Some(limit) = self.retention {
            if log.len() > limit {
                let excess = log.len() - limit;
                log.drain(..excess);
            }
        }

        tracing::debug!(key, ?outcome, records = log.len(), "Period log updated");
        outcome
    }

    /// Rewrite records keyed by a full RFC 3339 timestamp to this clock's
    /// period keys.
    ///
    /// Older hourly logs stored the UTC instant of each sample. After
    /// rewriting, the log is sorted and only the latest record per period is
    /// kept. Returns how many keys were rewritten.
    pub fn normalize_keys(&self, log: &mut Vec<PeriodRecord>) -> usize {
        let mut rewritten = 0;
        for record in log.iter_mut() {
            let Ok(instant) = DateTime::parse_from_rfc3339(&record.period_key) else {
                continue;
            };
            let instant = instant.with_timezone(&Utc);
            record.period_key = self.clock.key_for(instant);
            record.logged_at.get_or_insert(instant);
            rewritten += 1;
        }
        if rewritten == 0 {
            return 0;
        }

        // stable, so later samples of the same period stay after earlier ones
        log.sort_by(|a, b| a.period_key.cmp(&b.period_key));
        let mut deduped: Vec<PeriodRecord> = Vec::with_capacity(log.len());
        for record in log.drain(..) {
            match deduped.last_mut() {
                Some(last) if last.period_key == record.period_key => *last = record,
                _ => deduped.push(record),
            }
        }
        *log = deduped;

        tracing::info!(rewritten, records = log.len(), "Normalized legacy period keys");
        rewritten
    }
}
