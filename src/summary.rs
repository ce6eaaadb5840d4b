//! Grid-wide summary and fault detection over a regional snapshot.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::balance::RegionStatus;
use crate::round2;

/// Regional frequency deviations beyond this band raise a fault (Hz).
const FREQUENCY_FAULT_BAND_HZ: f64 = 0.3;

/// Deviations outside 49.5..50.5 Hz escalate from medium to high.
const FREQUENCY_SEVERE_BAND_HZ: f64 = 0.5;

/// Load factor above this raises a high-load fault (%).
const LOAD_FAULT_PCT: f64 = 90.0;

/// Load factor above this escalates the fault to critical (%).
const LOAD_CRITICAL_PCT: f64 = 95.0;

/// Aggregate view of a regional snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSummary {
    /// Total generation across regions (MW).
    pub total_generation_mw: f64,
    /// Total consumption across regions (MW).
    pub total_consumption_mw: f64,
    /// Generation headroom over consumption, as a share of generation
    /// (%, 2 decimals). 0 when nothing generates.
    pub reserve_margin_pct: f64,
    /// Mean regional frequency (Hz).
    pub mean_frequency_hz: f64,
    /// Number of regions in the snapshot.
    pub region_count: usize,
}

impl GridSummary {
    /// Summarizes a snapshot. An empty snapshot reports zeros and the
    /// nominal 50 Hz.
    pub fn from_snapshot(snapshot: &BTreeMap<String, RegionStatus>) -> Self {
        let total_generation_mw: f64 = snapshot.values().map(|r| r.generation).sum();
        let total_consumption_mw: f64 = snapshot.values().map(|r| r.consumption).sum();
        let reserve_margin_pct = if total_generation_mw > 0.0 {
            round2((total_generation_mw - total_consumption_mw) / total_generation_mw * 100.0)
        } else {
            0.0
        };
        let mean_frequency_hz = if snapshot.is_empty() {
            50.0
        } else {
            round2(snapshot.values().map(|r| r.frequency).sum::<f64>() / snapshot.len() as f64)
        };
        Self {
            total_generation_mw,
            total_consumption_mw,
            reserve_margin_pct,
            mean_frequency_hz,
            region_count: snapshot.len(),
        }
    }
}

impl fmt::Display for GridSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Grid Summary ---")?;
        writeln!(f, "Generation:     {:>12.2} MW", self.total_generation_mw)?;
        writeln!(f, "Consumption:    {:>12.2} MW", self.total_consumption_mw)?;
        writeln!(f, "Reserve margin: {:>12.2} %", self.reserve_margin_pct)?;
        writeln!(f, "Mean frequency: {:>12.2} Hz", self.mean_frequency_hz)?;
        write!(f, "Regions:        {:>12}", self.region_count)
    }
}

/// What kind of condition a fault describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Regional frequency outside the acceptable band.
    FrequencyDeviation,
    /// Consumption close to or above generation capacity.
    HighLoad,
}

/// How urgent a fault is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// One detected grid fault.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridFault {
    pub kind: FaultKind,
    pub region: String,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for GridFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.severity, self.message)
    }
}

/// Scans a snapshot for frequency deviations and overloaded regions.
///
/// Regions are visited in name order, frequency checks before load checks,
/// so the fault list is deterministic for a given snapshot.
pub fn detect_faults(snapshot: &BTreeMap<String, RegionStatus>) -> Vec<GridFault> {
    let mut faults = Vec::new();

    for (region, status) in snapshot {
        if (status.frequency - 50.0).abs() > FREQUENCY_FAULT_BAND_HZ {
            let severity = if (status.frequency - 50.0).abs() > FREQUENCY_SEVERE_BAND_HZ {
                Severity::High
            } else {
                Severity::Medium
            };
            faults.push(GridFault {
                kind: FaultKind::FrequencyDeviation,
                region: region.clone(),
                severity,
                message: format!(
                    "frequency deviation in {region}: {:.2} Hz",
                    status.frequency
                ),
            });
        }

        if status.generation > 0.0 {
            let load_pct = status.consumption / status.generation * 100.0;
            if load_pct > LOAD_FAULT_PCT {
                let severity = if load_pct > LOAD_CRITICAL_PCT {
                    Severity::Critical
                } else {
                    Severity::High
                };
                faults.push(GridFault {
                    kind: FaultKind::HighLoad,
                    region: region.clone(),
                    severity,
                    message: format!("high load in {region}: {load_pct:.1}%"),
                });
            }
        }
    }

    faults
}
