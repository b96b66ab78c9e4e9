//! Ordered series types.
//!
//! A series is only constructible through validation: timestamps must be
//! strictly increasing. Stages downstream of the outlier filter take these
//! newtypes, so an unordered or duplicated input is rejected exactly once, at
//! the boundary, and never silently reordered.

use super::bar::Bar;
use super::enriched::EnrichedRow;
use chrono::NaiveDate;
use thiserror::Error;

/// Malformed input: the series violates the ordering contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("duplicate timestamp {timestamp} at row {index}")]
    DuplicateTimestamp { index: usize, timestamp: NaiveDate },

    #[error("timestamp {current} at row {index} precedes previous timestamp {previous}")]
    OutOfOrder {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Check that `timestamps` are strictly increasing.
pub fn check_strictly_increasing<I>(timestamps: I) -> Result<(), SeriesError>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut previous: Option<NaiveDate> = None;
    for (index, current) in timestamps.into_iter().enumerate() {
        if let Some(prev) = previous {
            if current == prev {
                return Err(SeriesError::DuplicateTimestamp {
                    index,
                    timestamp: current,
                });
            }
            if current < prev {
                return Err(SeriesError::OutOfOrder {
                    index,
                    previous: prev,
                    current,
                });
            }
        }
        previous = Some(current);
    }
    Ok(())
}

/// Cleaned bars ordered by timestamp, one per trading day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        check_strictly_increasing(bars.iter().map(|b| b.timestamp))?;
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Enriched rows ordered by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedSeries {
    rows: Vec<EnrichedRow>,
}

impl EnrichedSeries {
    pub fn new(rows: Vec<EnrichedRow>) -> Result<Self, SeriesError> {
        check_strictly_increasing(rows.iter().map(|r| r.timestamp))?;
        Ok(Self { rows })
    }

    /// Build from rows already known to be ordered (derived row-for-row
    /// from a validated [`Series`]).
    pub(crate) fn from_ordered(rows: Vec<EnrichedRow>) -> Self {
        debug_assert!(check_strictly_increasing(rows.iter().map(|r| r.timestamp)).is_ok());
        Self { rows }
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(day: u32) -> Bar {
        Bar {
            timestamp: d(day),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        }
    }

    #[test]
    fn ordered_series_accepted() {
        let series = Series::new(vec![bar(2), bar(3), bar(5)]).unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn duplicate_rejected() {
        let err = Series::new(vec![bar(2), bar(3), bar(3)]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::DuplicateTimestamp {
                index: 2,
                timestamp: d(3)
            }
        );
    }

    #[test]
    fn out_of_order_rejected() {
        let err = Series::new(vec![bar(4), bar(2)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn empty_series_is_valid() {
        assert!(Series::new(Vec::new()).unwrap().is_empty());
    }
}
