//! Data types shared across the load-balancing simulator.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::balance::scenario::Scenario;
use crate::round2;

/// Live electrical state of one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionStatus {
    /// Generation (MW).
    pub generation: f64,
    /// Consumption (MW).
    pub consumption: f64,
    /// Generation minus consumption (MW). Positive means surplus.
    pub balance: f64,
    /// Grid frequency (Hz), nominally 50.0.
    pub frequency: f64,
}

impl RegionStatus {
    /// Builds a status with the balance derived from generation and
    /// consumption.
    pub fn new(generation: f64, consumption: f64, frequency: f64) -> Self {
        Self {
            generation,
            consumption,
            balance: generation - consumption,
            frequency,
        }
    }

    /// Recomputes the balance after generation or consumption changed.
    pub(crate) fn refresh_balance(&mut self) {
        self.balance = self.generation - self.consumption;
    }
}

/// One power transfer proposed by the balancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingAction {
    /// Region giving up surplus power.
    pub source_region: String,
    /// Region receiving the power.
    pub target_region: String,
    /// Transferred amount (MW, 2 decimals).
    pub amount_mw: f64,
    /// When the action was generated.
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for BalancingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {:.2} MW",
            self.source_region, self.target_region, self.amount_mw
        )
    }
}

/// Aggregate outcome metrics of one balancing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancingMetrics {
    /// Total unmet deficit before balancing: the summed magnitude of all
    /// negative regional balances (MW).
    pub initial_imbalance_mw: f64,
    /// Total unmet deficit after balancing (MW).
    pub remaining_imbalance_mw: f64,
    /// Relative reduction of total imbalance, 0..=100.
    pub improvement_pct: f64,
    /// Number of transfers performed.
    pub transfer_count: usize,
    /// Total transferred power (MW).
    pub total_transferred_mw: f64,
}

impl BalancingMetrics {
    /// Derives the metrics from total imbalances and the action list.
    pub(crate) fn derive(initial: f64, remaining: f64, actions: &[BalancingAction]) -> Self {
        let improvement = if initial > 0.0 {
            (initial - remaining) / initial * 100.0
        } else {
            0.0
        };
        Self {
            initial_imbalance_mw: round2(initial),
            remaining_imbalance_mw: round2(remaining),
            improvement_pct: round2(improvement),
            transfer_count: actions.len(),
            total_transferred_mw: round2(actions.iter().map(|a| a.amount_mw).sum()),
        }
    }
}

/// Full outcome of one load-balancing simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancingResult {
    /// Scenario that was simulated.
    pub scenario: Scenario,
    /// Regional status after scenario perturbation, before transfers.
    pub initial_status: BTreeMap<String, RegionStatus>,
    /// Regional status after transfers and frequency re-estimation.
    pub balanced_status: BTreeMap<String, RegionStatus>,
    /// Transfers in the order they were performed.
    pub actions: Vec<BalancingAction>,
    /// Aggregate outcome metrics.
    pub metrics: BalancingMetrics,
}

impl fmt::Display for BalancingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Load Balancing ({}) ---", self.scenario)?;
        writeln!(
            f,
            "Initial imbalance:   {:>12.2} MW",
            self.metrics.initial_imbalance_mw
        )?;
        writeln!(
            f,
            "Remaining imbalance: {:>12.2} MW",
            self.metrics.remaining_imbalance_mw
        )?;
        writeln!(
            f,
            "Improvement:         {:>12.2} %",
            self.metrics.improvement_pct
        )?;
        writeln!(
            f,
            "Transfers:           {:>12} ({:.2} MW total)",
            self.metrics.transfer_count, self.metrics.total_transferred_mw
        )?;
        for action in &self.actions {
            writeln!(f, "  {action}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_derives_balance() {
        let status = RegionStatus::new(100.0, 80.0, 50.0);
        assert_eq!(status.balance, 20.0);
    }

    #[test]
    fn metrics_improvement_is_relative() {
        let metrics = BalancingMetrics::derive(40.0, 20.0, &[]);
        assert_eq!(metrics.improvement_pct, 50.0);
        assert_eq!(metrics.transfer_count, 0);
    }

    #[test]
    fn zero_initial_imbalance_reports_zero_improvement() {
        let metrics = BalancingMetrics::derive(0.0, 0.0, &[]);
        assert_eq!(metrics.improvement_pct, 0.0);
    }

    #[test]
    fn action_display_names_both_regions() {
        let action = BalancingAction {
            source_region: "northern".to_string(),
            target_region: "southern".to_string(),
            amount_mw: 12.5,
            timestamp: Utc::now(),
        };
        assert_eq!(action.to_string(), "northern -> southern: 12.50 MW");
    }
}
