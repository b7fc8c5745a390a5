//! Per-region flight counts.
//!
//! [`RegionMetrics`] holds a snapshot of records and answers "top regions"
//! queries over it. Answers are memoized per query in a [`TtlCache`]; loading
//! a new snapshot drops them all.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::MetricsConfig;
use crate::record::FlightRecord;

/// A region query: optional start-time window plus a result limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RegionQuery {
    /// Earliest start time counted, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Latest start time counted, inclusive.
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of regions returned.
    pub top: Option<usize>,
}

/// One row of a region report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionCount {
    /// Region label.
    pub region: String,
    /// Number of records.
    pub count: usize,
}

/// Count records per region label.
///
/// Records without a region label are not counted. With a window set, records
/// without a start time are not counted either. Rows are ordered by count
/// descending, then by name.
#[must_use]
pub fn count_regions(records: &[FlightRecord], query: &RegionQuery) -> Vec<RegionCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|r| in_window(r, query)) {
        if let Some(region) = record.region().map(str::trim).filter(|r| !r.is_empty()) {
            *counts.entry(region).or_default() += 1;
        }
    }

    let mut rows: Vec<RegionCount> = counts
        .into_iter()
        .map(|(region, count)| RegionCount {
            region: region.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.region.cmp(&b.region)));

    if let Some(top) = query.top {
        rows.truncate(top);
    }
    rows
}

fn in_window(record: &FlightRecord, query: &RegionQuery) -> bool {
    if query.from.is_none() && query.to.is_none() {
        return true;
    }
    let Some(start) = record.start_time else {
        return false;
    };
    query.from.map_or(true, |from| start >= from) && query.to.map_or(true, |to| start <= to)
}

/// Region report over a record snapshot, with cached answers.
#[derive(Debug)]
pub struct RegionMetrics<C = SystemClock> {
    records: Vec<FlightRecord>,
    cache: TtlCache<RegionQuery, Vec<RegionCount>, C>,
    default_top: usize,
}

impl RegionMetrics<SystemClock> {
    /// Create metrics over `records` on the system clock.
    #[must_use]
    pub fn new(records: Vec<FlightRecord>, config: &MetricsConfig) -> Self {
        Self::with_clock(records, config, SystemClock)
    }
}

impl<C: Clock> RegionMetrics<C> {
    /// Create metrics over `records` on the given clock.
    #[must_use]
    pub fn with_clock(records: Vec<FlightRecord>, config: &MetricsConfig, clock: C) -> Self {
        Self {
            records,
            cache: TtlCache::with_clock(
                config.cache_ttl(),
                config.cache_max_entries,
                clock,
            ),
            default_top: config.top.max(1),
        }
    }

    /// Replace the snapshot and drop cached answers.
    pub fn refresh(&mut self, records: Vec<FlightRecord>) {
        self.records = records;
        self.cache.clear();
    }

    /// Number of records in the snapshot.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Top regions for a query. A query without `top` uses the configured one.
    pub fn top_regions(&mut self, query: &RegionQuery) -> Vec<RegionCount> {
        let key = RegionQuery {
            top: Some(query.top.unwrap_or(self.default_top)),
            ..query.clone()
        };

        if let Some(rows) = self.cache.get(&key) {
            debug!(?key, "Region metrics cache hit");
            return rows.clone();
        }

        let rows = count_regions(&self.records, &key);
        self.cache.insert(key, rows.clone());
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::message::FlightMessage;
    use crate::normalizer::normalize;
    use chrono::{TimeDelta, TimeZone};

    fn record(region: Option<&str>, dof: &str) -> FlightRecord {
        let mut message = FlightMessage::new(Some(&format!("-DOF/{dof} REG/X1")), Some("-ATD 1000"), None);
        if let Some(region) = region {
            message = message.with_region(region);
        }
        normalize(&message)
    }

    fn snapshot() -> Vec<FlightRecord> {
        vec![
            record(Some("Moscow"), "010125"),
            record(Some("Moscow"), "020125"),
            record(Some("Kazan"), "030125"),
            record(Some("Anadyr"), "010225"),
            record(Some("Moscow"), "010325"),
            record(None, "010125"),
            record(Some("  "), "010125"),
        ]
    }

    fn row(region: &str, count: usize) -> RegionCount {
        RegionCount {
            region: region.to_string(),
            count,
        }
    }

    #[test]
    fn test_count_regions_ordering() {
        let rows = count_regions(&snapshot(), &RegionQuery::default());
        assert_eq!(rows, vec![row("Moscow", 3), row("Anadyr", 1), row("Kazan", 1)]);
    }

    #[test]
    fn test_count_regions_top() {
        let query = RegionQuery {
            top: Some(2),
            ..RegionQuery::default()
        };
        let rows = count_regions(&snapshot(), &query);
        assert_eq!(rows, vec![row("Moscow", 3), row("Anadyr", 1)]);
    }

    #[test]
    fn test_count_regions_window() {
        let query = RegionQuery {
            from: Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap()),
            top: None,
        };
        let rows = count_regions(&snapshot(), &query);
        assert_eq!(rows, vec![row("Anadyr", 1), row("Kazan", 1), row("Moscow", 1)]);
    }

    #[test]
    fn test_window_excludes_unknown_start() {
        let records = vec![normalize(
            &FlightMessage::new(Some("REG/X1"), None, None).with_region("Moscow"),
        )];
        let query = RegionQuery {
            from: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..RegionQuery::default()
        };
        assert!(count_regions(&records, &query).is_empty());
        assert_eq!(count_regions(&records, &RegionQuery::default()).len(), 1);
    }

    #[test]
    fn test_metrics_cache_serves_until_ttl() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let config = MetricsConfig::default();
        let mut metrics = RegionMetrics::with_clock(snapshot(), &config, clock.clone());

        let first = metrics.top_regions(&RegionQuery::default());
        assert_eq!(first[0], row("Moscow", 3));

        // refresh drops the cache; a fresh answer reflects the new snapshot
        metrics.refresh(vec![record(Some("Kazan"), "010125")]);
        assert_eq!(metrics.top_regions(&RegionQuery::default()), vec![row("Kazan", 1)]);
        assert_eq!(metrics.record_count(), 1);

        clock.advance(TimeDelta::seconds(31));
        assert_eq!(metrics.top_regions(&RegionQuery::default()), vec![row("Kazan", 1)]);
    }

    #[test]
    fn test_metrics_default_top() {
        let config = MetricsConfig {
            top: 1,
            ..MetricsConfig::default()
        };
        let mut metrics = RegionMetrics::new(snapshot(), &config);
        assert_eq!(metrics.top_regions(&RegionQuery::default()), vec![row("Moscow", 3)]);

        let query = RegionQuery {
            top: Some(5),
            ..RegionQuery::default()
        };
        assert_eq!(metrics.top_regions(&query).len(), 3);
    }
}
