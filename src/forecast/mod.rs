//! Demand forecasting engine.
//!
//! Feature engineering ([`features`]), a seeded random-forest regressor
//! ([`forest`]), and the [`DemandForecaster`] that trains lazily and rolls
//! the model forward one day at a time. The forecaster never surfaces an
//! error from [`DemandForecaster::forecast_demand`]: every failure path
//! resolves to a deterministic weekly-pattern fallback series so the caller
//! always has a displayable curve.

pub mod features;
pub mod forest;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, Utc};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::round2;

pub use features::{
    FEATURE_COUNT, FEATURE_NAMES, FeatureRow, HistoricalDemandPoint, PreparedFeatures,
    prepare_features,
};
pub use forest::{ForestParams, RandomForest};

use features::calendar_features;

/// Fraction of surviving rows held out for validation.
const VALIDATION_FRACTION: f64 = 0.2;

/// Prediction bounds are ±5% of the point prediction.
const BOUND_FRACTION: f64 = 0.05;

/// Base demand of the fallback forecast (MW).
const FALLBACK_BASE_DEMAND_MW: f64 = 320_000.0;

/// Amplitude of the fallback forecast's weekly pattern (MW).
const FALLBACK_WEEKLY_SWING_MW: f64 = 15_000.0;

/// One forecast day with its uncertainty band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast date, one day after the previous point.
    pub date: NaiveDate,
    /// Point prediction of average demand (MW, 2 decimals).
    pub predicted_demand: f64,
    /// 5% below the point prediction (MW, 2 decimals).
    pub lower_bound: f64,
    /// 5% above the point prediction (MW, 2 decimals).
    pub upper_bound: f64,
}

/// Fit diagnostics reported by [`DemandForecaster::train`].
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    /// R² on the training split.
    pub train_score: f64,
    /// R² on the held-out validation split.
    pub validation_score: f64,
    /// Normalized per-feature importances, keyed by feature name.
    pub feature_importance: BTreeMap<String, f64>,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Demand Model ---")?;
        writeln!(f, "Train R²:       {:.4}", self.train_score)?;
        writeln!(f, "Validation R²:  {:.4}", self.validation_score)?;
        write!(f, "Top features:  ")?;
        let mut ranked: Vec<(&str, f64)> = self
            .feature_importance
            .iter()
            .map(|(k, &v)| (k.as_str(), v))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (name, weight) in ranked.iter().take(3) {
            write!(f, " {name}={weight:.3}")?;
        }
        Ok(())
    }
}

/// Demand forecaster with an explicitly owned, lazily trained model.
///
/// The trained ensemble lives on the instance and is reused by every later
/// forecast call; there is no retraining trigger beyond the model's absence.
/// Call [`train`](Self::train) to warm up eagerly, otherwise the first
/// [`forecast_demand`](Self::forecast_demand) call trains as a side effect.
/// Both take `&mut self`, so concurrent callers serialize through ownership.
#[derive(Debug, Default)]
pub struct DemandForecaster {
    params: ForestParams,
    model: Option<RandomForest>,
}

impl DemandForecaster {
    /// Creates an untrained forecaster with default hyperparameters
    /// (100 trees, depth 10, seed 42).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an untrained forecaster with explicit hyperparameters.
    pub fn with_params(params: ForestParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    /// Whether a trained model is cached on this instance.
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Fits the demand model on the given history and caches it.
    ///
    /// Splits the surviving feature rows 80/20 (seeded, reproducible),
    /// fits the forest on the training side, and reports R² scores plus
    /// normalized feature importances.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InsufficientData`] when fewer than 8 history points
    /// leave no usable feature row, [`ForecastError::Training`] when the
    /// split or fit degenerates.
    pub fn train(
        &mut self,
        history: &[HistoricalDemandPoint],
    ) -> Result<TrainingReport, ForecastError> {
        let prepared = prepare_features(history)?;
        let (train_x, train_y, val_x, val_y) =
            split_train_validation(&prepared.features, &prepared.targets, self.params.seed)?;

        let forest = RandomForest::fit(&train_x, &train_y, &self.params)?;
        let train_score = forest.score(&train_x, &train_y);
        let validation_score = forest.score(&val_x, &val_y);

        let feature_importance: BTreeMap<String, f64> = FEATURE_NAMES
            .iter()
            .zip(forest.feature_importances())
            .map(|(name, &weight)| ((*name).to_string(), weight))
            .collect();

        tracing::info!(train_score, validation_score, "demand model trained");

        self.model = Some(forest);
        Ok(TrainingReport {
            train_score,
            validation_score,
            feature_importance,
        })
    }

    /// Forecasts average demand for `horizon_days` days past the end of the
    /// history.
    ///
    /// Trains a model first if none is cached. Prediction is autoregressive:
    /// each step feeds the previous prediction back into the lag features,
    /// so errors compound with the horizon. Every failure path
    /// (short history, training failure, non-finite prediction) substitutes
    /// the deterministic fallback series; this method always returns exactly
    /// `horizon_days` points.
    pub fn forecast_demand(
        &mut self,
        history: &[HistoricalDemandPoint],
        horizon_days: usize,
    ) -> Vec<ForecastPoint> {
        match self.try_forecast(history, horizon_days) {
            Ok(points) => points,
            Err(error) => {
                tracing::warn!(%error, "substituting fallback demand forecast");
                let start = history
                    .iter()
                    .map(|p| p.date)
                    .max()
                    .unwrap_or_else(|| Utc::now().date_naive());
                fallback_forecast(start, horizon_days)
            }
        }
    }

    fn try_forecast(
        &mut self,
        history: &[HistoricalDemandPoint],
        horizon_days: usize,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        if self.model.is_none() {
            self.train(history)?;
        }
        let prepared = prepare_features(history)?;
        let forest = self
            .model
            .as_ref()
            .ok_or_else(|| ForecastError::Training("model missing after training".to_string()))?;

        let mut lag1 = prepared.last_row[4];
        let mut lag2 = prepared.last_row[5];
        let mut lag7 = prepared.last_row[6];
        let mut rolling_mean3 = prepared.last_row[7];
        let mut rolling_mean7 = prepared.last_row[8];
        let mut prev_emitted = 0.0;

        let mut points = Vec::with_capacity(horizon_days);
        for step in 1..=horizon_days as i64 {
            let date = prepared.last_date + Duration::days(step);
            let (dow, month, day, weekend) = calendar_features(date);
            let raw: FeatureRow = [
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
            let predicted = forest.predict(&prepared.scaler.transform(&raw));
            if !predicted.is_finite() {
                return Err(ForecastError::Prediction(format!(
                    "non-finite prediction at step {step}"
                )));
            }

            points.push(ForecastPoint {
                date,
                predicted_demand: round2(predicted),
                lower_bound: round2(predicted * (1.0 - BOUND_FRACTION)),
                upper_bound: round2(predicted * (1.0 + BOUND_FRACTION)),
            });

            // Shift the lag state: the model's own prediction becomes lag1.
            let carry = if step == 1 {
                prepared.last_average_demand
            } else {
                prev_emitted
            };
            lag7 = lag2;
            lag2 = lag1;
            lag1 = predicted;
            rolling_mean3 = (lag1 + lag2 + carry) / 3.0;
            // No true 7-day window exists mid-forecast; blend the three known
            // lags with the current prediction weighted 4x. This is a coarse
            // approximation of the trailing mean, not an exact one.
            rolling_mean7 = (lag1 + lag2 + lag7 + predicted * 4.0) / 7.0;
            prev_emitted = round2(predicted);
        }

        Ok(points)
    }
}

/// Deterministic fallback forecast: base demand plus a weekly swing of
/// `15000 * (((day_offset % 7) - 3) / 3)` MW, with the usual ±5% bounds.
/// Needs no history and cannot fail.
pub fn fallback_forecast(start: NaiveDate, horizon_days: usize) -> Vec<ForecastPoint> {
    (1..=horizon_days as i64)
        .map(|offset| {
            let swing = FALLBACK_WEEKLY_SWING_MW * (((offset % 7) as f64 - 3.0) / 3.0);
            let predicted = FALLBACK_BASE_DEMAND_MW + swing;
            ForecastPoint {
                date: start + Duration::days(offset),
                predicted_demand: round2(predicted),
                lower_bound: round2(predicted * (1.0 - BOUND_FRACTION)),
                upper_bound: round2(predicted * (1.0 + BOUND_FRACTION)),
            }
        })
        .collect()
}

/// Shuffled 80/20 split of the surviving rows, reproducible from `seed`.
#[expect(clippy::type_complexity)]
fn split_train_validation(
    x: &[FeatureRow],
    y: &[f64],
    seed: u64,
) -> Result<(Vec<FeatureRow>, Vec<f64>, Vec<FeatureRow>, Vec<f64>), ForecastError> {
    let n = x.len();
    let n_val = ((n as f64) * VALIDATION_FRACTION).ceil() as usize;
    if n_val >= n {
        return Err(ForecastError::Training(format!(
            "not enough rows to split: {n} total, {n_val} held out"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let (val_idx, train_idx) = indices.split_at(n_val);
    let take = |idx: &[usize]| -> (Vec<FeatureRow>, Vec<f64>) {
        (
            idx.iter().map(|&i| x[i]).collect(),
            idx.iter().map(|&i| y[i]).collect(),
        )
    };
    let (train_x, train_y) = take(train_idx);
    let (val_x, val_y) = take(val_idx);
    Ok((train_x, train_y, val_x, val_y))
}
