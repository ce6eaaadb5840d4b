//! CSV export for forecast points and balancing actions.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::balance::BalancingAction;
use crate::forecast::ForecastPoint;

/// Column header for forecast CSV export.
const FORECAST_HEADER: &str = "date,predicted_demand_mw,lower_bound_mw,upper_bound_mw";

/// Column header for balancing action CSV export.
const ACTIONS_HEADER: &str = "timestamp,source_region,target_region,amount_mw";

/// Exports a forecast series to a CSV file at the given path.
///
/// Writes a header row followed by one row per forecast day. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_forecast_csv(points: &[ForecastPoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_forecast_csv(points, buf)
}

/// Writes a forecast series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_forecast_csv(points: &[ForecastPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(FORECAST_HEADER.split(','))?;
    for p in points {
        wtr.write_record(&[
            p.date.to_string(),
            format!("{:.2}", p.predicted_demand),
            format!("{:.2}", p.lower_bound),
            format!("{:.2}", p.upper_bound),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports balancing actions to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_actions_csv(actions: &[BalancingAction], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_actions_csv(actions, buf)
}

/// Writes balancing actions as CSV to any writer, in transfer order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_actions_csv(actions: &[BalancingAction], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(ACTIONS_HEADER.split(','))?;
    for a in actions {
        wtr.write_record(&[
            a.timestamp.to_rfc3339(),
            a.source_region.clone(),
            a.target_region.clone(),
            format!("{:.2}", a.amount_mw),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_point(day: u32) -> ForecastPoint {
        let predicted = 300_000.0 + day as f64;
        ForecastPoint {
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            predicted_demand: predicted,
            lower_bound: predicted * 0.95,
            upper_bound: predicted * 1.05,
        }
    }

    fn make_action(amount: f64) -> BalancingAction {
        BalancingAction {
            source_region: "northern".to_string(),
            target_region: "southern".to_string(),
            amount_mw: amount,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn forecast_header_and_row_count() {
        let points: Vec<ForecastPoint> = (1..=7).map(make_point).collect();
        let mut buf = Vec::new();
        write_forecast_csv(&points, &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], FORECAST_HEADER);
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("2024-06-01,300001.00,"));
    }

    #[test]
    fn actions_rows_carry_rfc3339_timestamps() {
        let actions = vec![make_action(20.0), make_action(5.5)];
        let mut buf = Vec::new();
        write_actions_csv(&actions, &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], ACTIONS_HEADER);
        assert_eq!(lines[1], "2024-06-01T12:00:00+00:00,northern,southern,20.00");
        assert_eq!(lines[2], "2024-06-01T12:00:00+00:00,northern,southern,5.50");
    }

    #[test]
    fn deterministic_output() {
        let points: Vec<ForecastPoint> = (1..=5).map(make_point).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_forecast_csv(&points, &mut buf1).ok();
        write_forecast_csv(&points, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn empty_input_writes_header_only() {
        let mut buf = Vec::new();
        write_actions_csv(&[], &mut buf).ok();
        let output = String::from_utf8(buf).unwrap_or_default();
        assert_eq!(output.lines().count(), 1);
    }
}
