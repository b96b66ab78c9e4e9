//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(close, period)
//! - Std: stddev(close, period), sample convention by default
//! - Upper: middle + mult * std
//! - Lower: middle - mult * std
//!
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;
use crate::rolling::{RollingWindow, StdDev};

/// Which series of the Bollinger Bands an [`Indicator`] instance reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    StdDev,
}

/// All four Bollinger values at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub middle: f64,
    pub std: f64,
    pub upper: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    std_dev: StdDev,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, std_dev: StdDev, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
            BollingerBand::StdDev => "std",
        };
        Self {
            period,
            multiplier,
            std_dev,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, StdDev::default(), BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, StdDev::default(), BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, StdDev::default(), BollingerBand::Lower)
    }

    /// Compute all bands in one pass.
    pub fn bands(&self, bars: &[Bar]) -> Vec<Option<BollingerBands>> {
        let mut window = RollingWindow::new(self.period);
        bars.iter()
            .map(|bar| {
                window.push(Some(bar.close));
                let middle = window.mean()?;
                let std = window.std_dev(self.std_dev)?;
                Some(BollingerBands {
                    middle,
                    std,
                    upper: middle + self.multiplier * std,
                    lower: middle - self.multiplier * std,
                })
            })
            .collect()
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        self.bands(bars)
            .into_iter()
            .map(|b| {
                b.map(|b| match self.band {
                    BollingerBand::Upper => b.upper,
                    BollingerBand::Middle => b.middle,
                    BollingerBand::Lower => b.lower,
                    BollingerBand::StdDev => b.std,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bollinger_middle_is_sma() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Bollinger::middle(3, 2.0).compute(&bars);

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        // SMA[2] = mean(10,11,12) = 11.0
        assert_approx(result[2].unwrap(), 11.0, DEFAULT_EPSILON);
        // SMA[3] = mean(11,12,13) = 12.0
        assert_approx(result[3].unwrap(), 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_sample_std() {
        // window [10,11,12]: sample variance = (1+0+1)/2 = 1
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let bands = Bollinger::upper(3, 2.0).bands(&bars);
        let b = bands[2].unwrap();
        assert_approx(b.std, 1.0, DEFAULT_EPSILON);
        assert_approx(b.upper, 13.0, DEFAULT_EPSILON);
        assert_approx(b.lower, 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bollinger_population_std() {
        // population variance = 2/3
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let bb = Bollinger::new(3, 2.0, StdDev::Population, BollingerBand::StdDev);
        assert_eq!(bb.name(), "bollinger_std_3_2");
        assert_approx(
            bb.compute(&bars)[2].unwrap(),
            (2.0_f64 / 3.0).sqrt(),
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn bollinger_bands_symmetric() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let upper = Bollinger::upper(3, 2.0).compute(&bars);
        let middle = Bollinger::middle(3, 2.0).compute(&bars);
        let lower = Bollinger::lower(3, 2.0).compute(&bars);

        for i in 2..5 {
            let half_width = upper[i].unwrap() - middle[i].unwrap();
            assert_approx(
                middle[i].unwrap() - lower[i].unwrap(),
                half_width,
                DEFAULT_EPSILON,
            );
        }
    }

    #[test]
    fn bollinger_constant_price_zero_width() {
        let bars = make_bars(&[100.0; 25]);
        let bands = Bollinger::upper(20, 2.0).bands(&bars);

        // Constant price → std = 0 → bands collapse to the SMA
        for b in bands.iter().skip(19) {
            let b = b.unwrap();
            assert_eq!(b.std, 0.0);
            assert_eq!(b.upper, 100.0);
            assert_eq!(b.lower, 100.0);
            assert_eq!(b.middle, 100.0);
        }
    }

    #[test]
    fn bollinger_lookback() {
        assert_eq!(Bollinger::upper(20, 2.0).lookback(), 19);
    }
}
