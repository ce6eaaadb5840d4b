//! Power-grid monitoring core: demand forecasting and load-balancing simulation.

pub mod balance;
pub mod config;
pub mod error;
/// Feature engineering, model training, and multi-step demand prediction.
pub mod forecast;
pub mod io;
pub mod source;
pub mod summary;

/// Rounds to 2 decimal places, the precision of all reported MW figures.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
