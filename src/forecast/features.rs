//! Feature engineering for the demand model.
//!
//! Turns a raw historical demand series into the fixed nine-column feature
//! matrix the regressor trains on: calendar features derived from each date,
//! lagged demand values, and trailing rolling means. Rows whose lag or
//! rolling windows are not fully populated (the first seven rows of any
//! series) are dropped before standardization.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Number of model features per row.
pub const FEATURE_COUNT: usize = 9;

/// Feature names in column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "dayofweek",
    "month",
    "day",
    "is_weekend",
    "lag1",
    "lag2",
    "lag7",
    "rolling_mean3",
    "rolling_mean7",
];

/// One row of the feature matrix, in [`FEATURE_NAMES`] column order.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// One day of historical demand, as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDemandPoint {
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Peak demand over the day (MW).
    pub peak_demand: f64,
    /// Minimum demand over the day (MW).
    pub minimum_demand: f64,
    /// Average demand over the day (MW), the forecast target.
    pub average_demand: f64,
}

/// Per-feature standardization fitted on one call's data.
///
/// Zero-variance columns keep a unit scale so constant features map to zero
/// rather than NaN, matching the usual scaler convention.
#[derive(Debug, Clone)]
pub struct FeatureScaler {
    means: [f64; FEATURE_COUNT],
    scales: [f64; FEATURE_COUNT],
}

impl FeatureScaler {
    /// Fits column means and standard deviations on the given rows.
    fn fit(rows: &[FeatureRow]) -> Self {
        let n = rows.len() as f64;
        let mut means = [0.0; FEATURE_COUNT];
        let mut scales = [1.0; FEATURE_COUNT];

        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        for (col, scale) in scales.iter_mut().enumerate() {
            let var = rows
                .iter()
                .map(|row| {
                    let d = row[col] - means[col];
                    d * d
                })
                .sum::<f64>()
                / n;
            let std = var.sqrt();
            if std > 0.0 {
                *scale = std;
            }
        }

        Self { means, scales }
    }

    /// Standardizes one raw feature row.
    pub fn transform(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; FEATURE_COUNT];
        for col in 0..FEATURE_COUNT {
            out[col] = (row[col] - self.means[col]) / self.scales[col];
        }
        out
    }
}

/// Output of feature preparation: the standardized design matrix plus the
/// state needed to seed iterative forecasting.
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    /// Standardized feature rows, one per surviving observation.
    pub features: Vec<FeatureRow>,
    /// Raw (unstandardized) feature rows, aligned with `features`.
    pub raw_features: Vec<FeatureRow>,
    /// Target `average_demand` values, aligned with `features`.
    pub targets: Vec<f64>,
    /// Scaler fitted on this call's rows.
    pub scaler: FeatureScaler,
    /// Date of the last surviving observation.
    pub last_date: NaiveDate,
    /// Raw feature row of the last surviving observation.
    pub last_row: FeatureRow,
    /// Observed average demand of the last surviving observation (MW).
    pub last_average_demand: f64,
}

/// Calendar features for one date: `(dayofweek, month, day, is_weekend)`.
///
/// `dayofweek` is Monday-based (0..=6); weekends are Saturday and Sunday.
pub(crate) fn calendar_features(date: NaiveDate) -> (f64, f64, f64, f64) {
    let dow = date.weekday().num_days_from_monday();
    let weekend = if dow >= 5 { 1.0 } else { 0.0 };
    (
        f64::from(dow),
        f64::from(date.month()),
        f64::from(date.day()),
        weekend,
    )
}

/// Builds the standardized feature matrix from a historical series.
///
/// The series is sorted ascending by date (stable, so same-date points keep
/// their input order). `lag1`/`lag2`/`lag7` are the demand 1, 2, and 7
/// positions earlier; `rolling_mean3`/`rolling_mean7` are trailing means over
/// the preceding 3 and 7 points, full windows only. Rows missing any derived
/// feature are dropped, then features are standardized to zero mean and unit
/// variance fitted on this call's data.
///
/// # Errors
///
/// Returns [`ForecastError::InsufficientData`] when no row survives dropping
/// (any series shorter than 8 points).
pub fn prepare_features(
    history: &[HistoricalDemandPoint],
) -> Result<PreparedFeatures, ForecastError> {
    let mut series: Vec<&HistoricalDemandPoint> = history.iter().collect();
    series.sort_by_key(|p| p.date);

    let demand: Vec<f64> = series.iter().map(|p| p.average_demand).collect();

    let mut raw_features = Vec::new();
    let mut targets = Vec::new();
    let mut last: Option<(NaiveDate, FeatureRow, f64)> = None;

    for (i, point) in series.iter().enumerate() {
        // Full windows only: every derived feature needs 7 prior points.
        if i < 7 {
            continue;
        }
        let (dow, month, day, weekend) = calendar_features(point.date);
        let lag1 = demand[i - 1];
        let lag2 = demand[i - 2];
        let lag7 = demand[i - 7];
        let rolling_mean3 = demand[i - 3..i].iter().sum::<f64>() / 3.0;
        let rolling_mean7 = demand[i - 7..i].iter().sum::<f64>() / 7.0;

        let row: FeatureRow = [
            dow,
            month,
            day,
            weekend,
            lag1,
            lag2,
            lag7,
            rolling_mean3,
            rolling_mean7,
        ];
        raw_features.push(row);
        targets.push(point.average_demand);
        last = Some((point.date, row, point.average_demand));
    }

    let Some((last_date, last_row, last_average_demand)) = last else {
        return Err(ForecastError::InsufficientData {
            usable: 0,
            required: 1,
        });
    };

    let scaler = FeatureScaler::fit(&raw_features);
    let features = raw_features.iter().map(|r| scaler.transform(r)).collect();

    Ok(PreparedFeatures {
        features,
        raw_features,
        targets,
        scaler,
        last_date,
        last_row,
        last_average_demand,
    })
}
