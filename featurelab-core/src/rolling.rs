//! Rolling-window accumulator.
//!
//! A fixed-capacity sliding buffer over an ordered sequence of optional
//! values. Each `push` evicts the oldest value once the window is full and
//! updates the running statistics in O(1) amortized time:
//!
//! - mean and variance via Welford's update, with the matching downdate on
//!   eviction (a constant input keeps the variance at exactly zero)
//! - min and max via monotonic deques
//!
//! Statistics are only reported when the window holds `period` values and
//! none of them is missing. A missing value poisons every window it is part
//! of, mirroring how a gap propagates through a rolling computation.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Standard deviation convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdDev {
    /// Divide by N.
    Population,
    /// Divide by N - 1.
    #[default]
    Sample,
}

impl StdDev {
    /// Delta degrees of freedom.
    pub fn ddof(self) -> usize {
        match self {
            StdDev::Population => 0,
            StdDev::Sample => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<Option<f64>>,
    missing: usize,
    count: usize,
    mean: f64,
    m2: f64,
    seq: usize,
    max_q: VecDeque<(usize, f64)>,
    min_q: VecDeque<(usize, f64)>,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling window period must be >= 1");
        Self {
            period,
            values: VecDeque::with_capacity(period),
            missing: 0,
            count: 0,
            mean: 0.0,
            m2: 0.0,
            seq: 0,
            max_q: VecDeque::new(),
            min_q: VecDeque::new(),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Number of slots currently occupied (present or missing).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slide the window forward by one value. Non-finite values count as missing.
    pub fn push(&mut self, value: Option<f64>) {
        let value = value.filter(|v| v.is_finite());

        if self.values.len() == self.period {
            match self.values.pop_front() {
                Some(Some(old)) => self.downdate(old),
                Some(None) => self.missing -= 1,
                None => {}
            }
        }

        let idx = self.seq;
        self.seq += 1;
        self.values.push_back(value);

        match value {
            Some(x) => {
                self.update(x);
                while matches!(self.max_q.back(), Some(&(_, v)) if v <= x) {
                    self.max_q.pop_back();
                }
                self.max_q.push_back((idx, x));
                while matches!(self.min_q.back(), Some(&(_, v)) if v >= x) {
                    self.min_q.pop_back();
                }
                self.min_q.push_back((idx, x));
            }
            None => self.missing += 1,
        }

        let oldest = self.seq - self.values.len();
        while matches!(self.max_q.front(), Some(&(i, _)) if i < oldest) {
            self.max_q.pop_front();
        }
        while matches!(self.min_q.front(), Some(&(i, _)) if i < oldest) {
            self.min_q.pop_front();
        }
    }

    /// True once `period` values are held and none is missing.
    pub fn is_full(&self) -> bool {
        self.values.len() == self.period && self.missing == 0
    }

    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        Some(self.uniform_value().unwrap_or(self.mean))
    }

    pub fn std_dev(&self, kind: StdDev) -> Option<f64> {
        if !self.is_full() || self.count <= kind.ddof() {
            return None;
        }
        if self.uniform_value().is_some() {
            return Some(0.0);
        }
        let variance = (self.m2 / (self.count - kind.ddof()) as f64).max(0.0);
        Some(variance.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.min_q.front().map(|&(_, v)| v)
    }

    pub fn max(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.max_q.front().map(|&(_, v)| v)
    }

    /// The common value when every value in the window is identical. The
    /// downdated moments can drift by a few ulps once distinct values have
    /// left the window; this keeps flat windows exact.
    fn uniform_value(&self) -> Option<f64> {
        match (self.min_q.front(), self.max_q.front()) {
            (Some(&(_, lo)), Some(&(_, hi))) if lo == hi => Some(lo),
            _ => None,
        }
    }

    fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    fn downdate(&mut self, x: f64) {
        if self.count <= 1 {
            self.count = 0;
            self.mean = 0.0;
            self.m2 = 0.0;
            return;
        }
        self.count -= 1;
        let delta = x - self.mean;
        self.mean -= delta / self.count as f64;
        self.m2 = (self.m2 - delta * (x - self.mean)).max(0.0);
    }
}

/// Apply a rolling statistic over a whole sequence, one output per input.
pub fn rolling_map<F>(values: &[Option<f64>], period: usize, mut stat: F) -> Vec<Option<f64>>
where
    F: FnMut(&RollingWindow) -> Option<f64>,
{
    let mut window = RollingWindow::new(period);
    values
        .iter()
        .map(|&v| {
            window.push(v);
            stat(&window)
        })
        .collect()
}
