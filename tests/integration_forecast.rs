//! Integration tests for the demand forecasting pipeline, from synthetic
//! feed to forecast series.

mod common;

use chrono::Duration;

use grid_monitor::forecast::fallback_forecast;
use grid_monitor::source::GridDataSource;

#[test]
fn synthetic_history_trains_a_model() {
    let history = common::default_history();
    let mut forecaster = common::small_forecaster();

    let report = forecaster.train(&history).expect("30 days train fine");
    assert!(forecaster.is_trained());
    assert!(report.train_score.is_finite());
    assert!(report.validation_score.is_finite());

    let total: f64 = report.feature_importance.values().sum();
    assert!((total - 1.0).abs() < 1e-9, "importances sum to {total}");
}

#[test]
fn forecast_extends_the_history_day_by_day() {
    let history = common::default_history();
    let mut forecaster = common::small_forecaster();
    let points = forecaster.forecast_demand(&history, 7);

    assert_eq!(points.len(), 7);
    assert_eq!(points[0].date, common::anchor_date() + Duration::days(1));
    for pair in points.windows(2) {
        assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
    }
    for p in &points {
        assert!(p.lower_bound <= p.predicted_demand);
        assert!(p.predicted_demand <= p.upper_bound);
        assert!(
            (p.lower_bound - p.predicted_demand * 0.95).abs() < 0.01,
            "bounds are 5% of the prediction: {p:?}"
        );
    }
}

#[test]
fn newest_first_feed_order_does_not_matter() {
    // The synthetic feed returns newest-first; the forecaster must sort.
    let mut oldest_first = common::default_history();
    oldest_first.reverse();

    let a = common::small_forecaster().forecast_demand(&common::default_history(), 5);
    let b = common::small_forecaster().forecast_demand(&oldest_first, 5);
    assert_eq!(a, b);
}

#[test]
fn predictions_stay_near_the_demand_level() {
    // Average demand in the synthetic series sits around 0.82 * 320000.
    let history = common::default_history();
    let mut forecaster = common::small_forecaster();
    for p in forecaster.forecast_demand(&history, 7) {
        assert!(
            (200_000.0..350_000.0).contains(&p.predicted_demand),
            "prediction far from the training range: {p:?}"
        );
    }
}

#[test]
fn too_short_history_yields_the_fallback_series() {
    let history = common::anchored_feed().historical_series(5);
    let mut forecaster = common::small_forecaster();

    let points = forecaster.forecast_demand(&history, 7);
    assert_eq!(points, fallback_forecast(common::anchor_date(), 7));
    assert_eq!(points[0].predicted_demand, 310_000.0);
    assert_eq!(points[6].predicted_demand, 305_000.0);
}

#[test]
fn same_seed_reproduces_the_whole_pipeline() {
    let history = common::default_history();
    let a = common::small_forecaster().forecast_demand(&history, 10);
    let b = common::small_forecaster().forecast_demand(&history, 10);
    assert_eq!(a, b);
}
