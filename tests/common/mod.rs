//! Shared test fixtures for integration tests.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use grid_monitor::balance::RegionStatus;
use grid_monitor::forecast::{DemandForecaster, ForestParams, HistoricalDemandPoint};
use grid_monitor::source::{DEFAULT_BASE_DEMAND_MW, GridDataSource, SyntheticFeed};

/// Fixed anchor date so synthetic series are reproducible across runs.
pub fn anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
}

/// Synthetic feed anchored at [`anchor_date`] with the default base demand.
pub fn anchored_feed() -> SyntheticFeed {
    SyntheticFeed::anchored(DEFAULT_BASE_DEMAND_MW, anchor_date())
}

/// 30 days of synthetic demand history ending at the anchor date.
pub fn default_history() -> Vec<HistoricalDemandPoint> {
    anchored_feed().historical_series(30)
}

/// A small, fast forecaster (25 trees, depth 8, seed 42).
pub fn small_forecaster() -> DemandForecaster {
    DemandForecaster::with_params(ForestParams {
        trees: 25,
        max_depth: 8,
        seed: 42,
    })
}

/// The two-region snapshot from the balancing walkthrough: `a` carries a
/// 20 MW surplus, `b` a 40 MW deficit.
pub fn two_region_snapshot() -> BTreeMap<String, RegionStatus> {
    BTreeMap::from([
        ("a".to_string(), RegionStatus::new(100.0, 80.0, 50.0)),
        ("b".to_string(), RegionStatus::new(50.0, 90.0, 49.9)),
    ])
}
