//! One-period change of close.
//!
//! Difference: close[t] - close[t-1]
//! Percent:    (close[t] - close[t-1]) / close[t-1]
//! Lookback: 1. A percent change off a zero close is undefined.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Difference,
    Percent,
}

#[derive(Debug, Clone)]
pub struct Change {
    kind: ChangeKind,
    name: String,
}

impl Change {
    pub fn difference() -> Self {
        Self {
            kind: ChangeKind::Difference,
            name: "diff_1".into(),
        }
    }

    pub fn percent() -> Self {
        Self {
            kind: ChangeKind::Percent,
            name: "pct_change_1".into(),
        }
    }
}

impl Indicator for Change {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        match self.kind {
            ChangeKind::Difference => diff(&closes),
            ChangeKind::Percent => pct_change(&closes),
        }
    }
}

/// Day-over-day difference. The first element is `None`.
pub fn diff(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|w| Some(w[1] - w[0])));
    out
}

/// Day-over-day fractional change. The first element is `None`, and so is
/// any change whose base value is zero.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    out.extend(values.windows(2).map(|w| {
        if w[0] == 0.0 {
            None
        } else {
            Some((w[1] - w[0]) / w[0])
        }
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn diff_basic() {
        let out = diff(&[10.0, 12.0, 11.0]);
        assert_eq!(out, vec![None, Some(2.0), Some(-1.0)]);
    }

    #[test]
    fn pct_change_basic() {
        // 100 -> 110 -> 99
        let out = pct_change(&[100.0, 110.0, 99.0]);
        assert!(out[0].is_none());
        assert_approx(out[1].unwrap(), 0.10, DEFAULT_EPSILON);
        assert_approx(out[2].unwrap(), -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_off_zero_is_undefined() {
        let out = pct_change(&[0.0, 5.0, 10.0]);
        assert!(out[1].is_none());
        assert_approx(out[2].unwrap(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_input() {
        assert!(diff(&[]).is_empty());
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn indicator_matches_free_functions() {
        let bars = make_bars(&[100.0, 101.0, 99.0, 102.0]);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(Change::difference().compute(&bars), diff(&closes));
        assert_eq!(Change::percent().compute(&bars), pct_change(&closes));
        assert_eq!(Change::percent().lookback(), 1);
    }
}
