//! Error taxonomy for the forecasting and balancing cores.
//!
//! The two components propagate failures differently on purpose: the
//! forecaster resolves every error into a deterministic fallback series
//! before it reaches the caller, while the balancer reports a structured
//! [`SimulationError`] and produces no partial result. Forecast output must
//! always be displayable; a balancing failure usually means bad input and
//! should not be masked with fabricated numbers.

use serde::Serialize;
use thiserror::Error;

/// Failures inside the demand-forecasting pipeline.
///
/// None of these escape
/// [`forecast_demand`](crate::forecast::DemandForecaster::forecast_demand);
/// they are logged and replaced by the fallback forecast.
/// [`train`](crate::forecast::DemandForecaster::train) surfaces them directly
/// so a caller can inspect why a model could not be fitted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ForecastError {
    /// Too little history survives feature construction to fit a model.
    #[error(
        "insufficient history: {usable} usable rows after feature construction \
         (need at least {required}; the first 7 points of any series carry \
         undefined lag/rolling features)"
    )]
    InsufficientData {
        /// Rows remaining after dropping incomplete feature rows.
        usable: usize,
        /// Minimum rows required to proceed.
        required: usize,
    },

    /// Model fitting failed (degenerate split, non-finite feature, ...).
    #[error("model training failed: {0}")]
    Training(String),

    /// Runtime failure during iterative multi-step prediction.
    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// A load-balancing simulation failure.
///
/// Carries the scenario and region set that were requested so the caller can
/// report what was attempted. The whole simulation call fails atomically;
/// there is no partial [`BalancingResult`](crate::balance::BalancingResult).
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[error("load balancing failed for scenario `{scenario}`: {message}")]
pub struct SimulationError {
    /// Canonical name of the requested scenario.
    pub scenario: String,
    /// Regions the simulation was asked to operate on.
    pub regions: Vec<String>,
    /// Human-readable failure description.
    pub message: String,
}
