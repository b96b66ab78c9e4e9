//! Monthly partitioning of an enriched series.
//!
//! Groups rows by the calendar `(year, month)` of their timestamp, in the
//! series' own calendar (no timezone conversion). Because the series is
//! ordered, each month is one contiguous run and groups come out in
//! timestamp order. Pure and deterministic.

use crate::domain::{EnrichedSeries, Partition, PartitionKey};
use chrono::Datelike;

pub fn partition(ticker: &str, series: &EnrichedSeries) -> Vec<Partition> {
    let mut partitions: Vec<Partition> = Vec::new();

    for row in series.rows() {
        let (year, month) = (row.timestamp.year(), row.timestamp.month());
        match partitions.last_mut() {
            Some(p) if p.key.year == year && p.key.month == month => p.rows.push(row.clone()),
            _ => partitions.push(Partition {
                key: PartitionKey::new(ticker, year, month),
                rows: vec![row.clone()],
            }),
        }
    }

    partitions
}
