//! CSV export of forecast series and balancing actions.

pub mod export;

pub use export::{export_actions_csv, export_forecast_csv, write_actions_csv, write_forecast_csv};
