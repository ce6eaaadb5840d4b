//! Greedy load-balancing engine.
//!
//! One simulation run filters the snapshot to the requested regions, applies
//! the scenario perturbation, matches surplus regions to deficit regions in
//! a single greedy pass, and re-estimates each region's frequency with a
//! linear sensitivity model. The balancer owns its RNG; seed it for
//! reproducible perturbations, or construct with [`LoadBalancer::new`] for
//! OS entropy.
//!
//! Unlike the forecaster there is no fallback here: a failed simulation
//! returns a [`SimulationError`] and no partial result.

use std::collections::BTreeMap;

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};

use crate::balance::scenario::{Scenario, apply_scenario};
use crate::balance::types::{BalancingAction, BalancingMetrics, BalancingResult, RegionStatus};
use crate::error::SimulationError;
use crate::round2;

/// Frequency drift per unit of balance change, relative to consumption.
const FREQUENCY_SENSITIVITY: f64 = 0.1;

/// Allowed frequency band after re-estimation (Hz).
const FREQUENCY_FLOOR_HZ: f64 = 49.8;
const FREQUENCY_CEIL_HZ: f64 = 50.2;

/// Load-balancing simulator.
#[derive(Debug)]
pub struct LoadBalancer {
    rng: StdRng,
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer {
    /// A balancer seeded from OS entropy. Runs are not reproducible.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// A deterministic balancer: the same seed, snapshot, and call sequence
    /// replay the same perturbations and transfers.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Runs one balancing simulation.
    ///
    /// An empty `region_filter` selects every region in the snapshot;
    /// otherwise only the named regions participate and unknown names are
    /// ignored. The input snapshot is never mutated.
    ///
    /// # Errors
    ///
    /// [`SimulationError`] when the filtered region set is empty, the
    /// scenario cannot be applied (renewable surplus needs two regions), or
    /// a region with zero consumption breaks the frequency model. The call
    /// fails atomically; no partial result is produced.
    pub fn simulate(
        &mut self,
        snapshot: &BTreeMap<String, RegionStatus>,
        scenario: Scenario,
        region_filter: &[String],
    ) -> Result<BalancingResult, SimulationError> {
        let err = |message: String| SimulationError {
            scenario: scenario.name().to_string(),
            regions: region_filter.to_vec(),
            message,
        };

        let mut initial: BTreeMap<String, RegionStatus> = snapshot
            .iter()
            .filter(|(name, _)| region_filter.is_empty() || region_filter.contains(*name))
            .map(|(name, region)| (name.clone(), *region))
            .collect();
        if initial.is_empty() {
            return Err(err("empty region set after filtering".to_string()));
        }

        apply_scenario(&mut initial, scenario, &mut self.rng).map_err(&err)?;

        let (balanced, actions) = rebalance(&initial).map_err(&err)?;

        let metrics =
            BalancingMetrics::derive(total_deficit(&initial), total_deficit(&balanced), &actions);

        tracing::info!(
            scenario = %scenario,
            regions = initial.len(),
            transfers = metrics.transfer_count,
            improvement_pct = metrics.improvement_pct,
            "load balancing complete"
        );

        Ok(BalancingResult {
            scenario,
            initial_status: initial,
            balanced_status: balanced,
            actions,
            metrics,
        })
    }
}

/// Summed magnitude of all negative balances (MW).
fn total_deficit(status: &BTreeMap<String, RegionStatus>) -> f64 {
    status.values().map(|r| (-r.balance).max(0.0)).sum()
}

/// Greedy surplus-to-deficit matching plus frequency re-estimation.
///
/// Both lists iterate in descending-balance order (ties broken by region
/// name), so the largest surplus serves the least-deficient region first.
/// Transfers conserve total system balance.
fn rebalance(
    initial: &BTreeMap<String, RegionStatus>,
) -> Result<(BTreeMap<String, RegionStatus>, Vec<BalancingAction>), String> {
    let mut entries: Vec<(String, f64)> = initial
        .iter()
        .map(|(name, region)| (name.clone(), region.balance))
        .collect();
    // BTreeMap iteration is name-ordered; the stable sort keeps that as the
    // tie-break.
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    let surplus: Vec<usize> = (0..entries.len()).filter(|&i| entries[i].1 > 0.0).collect();
    let deficit: Vec<usize> = (0..entries.len()).filter(|&i| entries[i].1 < 0.0).collect();

    let mut actions = Vec::new();
    for &s in &surplus {
        for &d in &deficit {
            let available = entries[s].1;
            if available <= 0.0 {
                break;
            }
            let needed = -entries[d].1;
            if needed <= 0.0 {
                continue;
            }
            let transfer = available.min(needed);
            entries[s].1 -= transfer;
            entries[d].1 += transfer;
            actions.push(BalancingAction {
                source_region: entries[s].0.clone(),
                target_region: entries[d].0.clone(),
                amount_mw: round2(transfer),
                timestamp: Utc::now(),
            });
        }
    }

    let mut balanced = initial.clone();
    for (name, balance) in entries {
        if let Some(region) = balanced.get_mut(&name) {
            region.balance = balance;
        }
    }

    // Linear frequency model: drift proportional to the balance change a
    // region saw, relative to its consumption, clamped to the allowed band.
    for (name, region) in balanced.iter_mut() {
        let base = initial
            .get(name)
            .ok_or_else(|| format!("region `{name}` vanished mid-balancing"))?;
        if base.consumption == 0.0 {
            return Err(format!(
                "zero consumption in region `{name}` breaks the frequency model"
            ));
        }
        let drift = (region.balance - base.balance) / base.consumption * FREQUENCY_SENSITIVITY;
        region.frequency = (region.frequency + drift).clamp(FREQUENCY_FLOOR_HZ, FREQUENCY_CEIL_HZ);
    }

    Ok((balanced, actions))
}
