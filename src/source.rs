//! Grid data sources.
//!
//! The core consumes two feeds: a historical demand series for the
//! forecaster and a live regional snapshot for the balancer. The
//! [`GridDataSource`] trait is the seam; [`SyntheticFeed`] is the built-in
//! implementation that generates plausible demo data with a weekly and a
//! seasonal component, no network required.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};

use crate::balance::RegionStatus;
use crate::forecast::HistoricalDemandPoint;

/// Base demand level of the synthetic series (MW).
pub const DEFAULT_BASE_DEMAND_MW: f64 = 320_000.0;

/// Where the core gets its grid data.
///
/// The historical series may arrive in any order; consumers sort by date
/// themselves.
pub trait GridDataSource {
    /// Daily demand history covering the most recent `days` days.
    fn historical_series(&self, days: usize) -> Vec<HistoricalDemandPoint>;

    /// Current generation, consumption, and frequency per region.
    fn regional_snapshot(&self) -> BTreeMap<String, RegionStatus>;
}

/// Deterministic synthetic grid feed.
///
/// Demand follows a weekly sawtooth plus a slow seasonal ramp around the
/// base level; the snapshot is a fixed five-region grid with one region
/// carrying a visible surplus and one exactly balanced.
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    base_demand_mw: f64,
    today: NaiveDate,
}

impl Default for SyntheticFeed {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DEMAND_MW)
    }
}

impl SyntheticFeed {
    /// A feed anchored at today's date.
    pub fn new(base_demand_mw: f64) -> Self {
        Self {
            base_demand_mw,
            today: Utc::now().date_naive(),
        }
    }

    /// A feed anchored at a fixed date, for reproducible output.
    pub fn anchored(base_demand_mw: f64, today: NaiveDate) -> Self {
        Self {
            base_demand_mw,
            today,
        }
    }
}

impl GridDataSource for SyntheticFeed {
    /// Newest-first series: index 0 is the anchor date, index `days - 1` the
    /// oldest point.
    fn historical_series(&self, days: usize) -> Vec<HistoricalDemandPoint> {
        (0..days)
            .map(|i| {
                let weekly = 10_000.0 * (((i % 7) as f64 - 3.0) / 3.0);
                let seasonal = 15_000.0 * (0.5 * (i % 365) as f64 / 182.5);
                let level = self.base_demand_mw + weekly + seasonal;
                HistoricalDemandPoint {
                    date: self.today - Duration::days(i as i64),
                    peak_demand: level.trunc(),
                    minimum_demand: (level * 0.65).trunc(),
                    average_demand: (level * 0.82).trunc(),
                }
            })
            .collect()
    }

    fn regional_snapshot(&self) -> BTreeMap<String, RegionStatus> {
        BTreeMap::from([
            (
                "northern".to_string(),
                RegionStatus::new(85_000.0, 83_500.0, 49.98),
            ),
            (
                "western".to_string(),
                RegionStatus::new(105_000.0, 102_000.0, 50.01),
            ),
            (
                "southern".to_string(),
                RegionStatus::new(65_000.0, 63_700.0, 49.99),
            ),
            (
                "eastern".to_string(),
                RegionStatus::new(50_750.0, 49_000.0, 50.02),
            ),
            (
                "northeastern".to_string(),
                RegionStatus::new(20_000.0, 20_000.0, 50.00),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> SyntheticFeed {
        SyntheticFeed::anchored(
            DEFAULT_BASE_DEMAND_MW,
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
        )
    }

    #[test]
    fn series_is_newest_first_with_daily_steps() {
        let series = feed().historical_series(30);
        assert_eq!(series.len(), 30);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        for pair in series.windows(2) {
            assert_eq!(pair[0].date - pair[1].date, Duration::days(1));
        }
    }

    #[test]
    fn demand_bands_keep_their_ratios() {
        for point in feed().historical_series(14) {
            assert!(point.minimum_demand < point.average_demand);
            assert!(point.average_demand < point.peak_demand);
            assert_eq!(point.minimum_demand, (point.peak_demand * 0.65).trunc());
            assert_eq!(point.average_demand, (point.peak_demand * 0.82).trunc());
        }
    }

    #[test]
    fn weekly_pattern_repeats() {
        let series = feed().historical_series(14);
        // Same weekday offset, one week apart: only the seasonal ramp differs.
        let drift = series[0].peak_demand - series[7].peak_demand;
        let seasonal_step = 15_000.0 * 0.5 * 7.0 / 182.5;
        assert!((drift + seasonal_step).abs() < 1.0, "got {drift}");
    }

    #[test]
    fn snapshot_has_five_regions_with_derived_balances() {
        let snapshot = feed().regional_snapshot();
        assert_eq!(snapshot.len(), 5);
        assert_eq!(snapshot["northern"].balance, 1_500.0);
        assert_eq!(snapshot["northeastern"].balance, 0.0);
        let generation: f64 = snapshot.values().map(|r| r.generation).sum();
        assert_eq!(generation, 325_750.0);
    }
}
