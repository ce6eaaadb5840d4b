//! Grid stress scenarios and their perturbations.
//!
//! A scenario mutates the regional snapshot before balancing runs: demand
//! spikes, renewable overproduction, or a partial generation outage. The
//! perturbation magnitudes are drawn from the balancer's RNG, so a seeded
//! balancer replays the same stress exactly.

use std::fmt;

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::balance::types::RegionStatus;
use std::collections::BTreeMap;

/// A named grid stress scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// No perturbation; balance the snapshot as delivered.
    #[default]
    Normal,
    /// Demand spike: consumption up 10-20%, frequency sags.
    Peak,
    /// Renewable overproduction in two random regions.
    RenewableSurplus,
    /// Outage in one random region: generation down 20-40%.
    Outage,
}

impl Scenario {
    /// Canonical scenario names, in declaration order.
    pub const NAMES: [&'static str; 4] = ["normal", "peak", "renewable_surplus", "outage"];

    /// Parses a scenario name leniently: unknown names mean no stress, so
    /// they resolve to [`Scenario::Normal`] rather than an error.
    pub fn from_name(name: &str) -> Self {
        match name {
            "peak" => Self::Peak,
            "renewable_surplus" => Self::RenewableSurplus,
            "outage" => Self::Outage,
            _ => Self::Normal,
        }
    }

    /// The canonical name, as accepted by [`from_name`](Self::from_name).
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Peak => "peak",
            Self::RenewableSurplus => "renewable_surplus",
            Self::Outage => "outage",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Applies the scenario's perturbation to the snapshot in place.
///
/// Balances of touched regions are refreshed. Returns a plain message on
/// failure; the caller wraps it with scenario and region context.
pub(crate) fn apply_scenario(
    status: &mut BTreeMap<String, RegionStatus>,
    scenario: Scenario,
    rng: &mut StdRng,
) -> Result<(), String> {
    match scenario {
        Scenario::Normal => {}
        Scenario::Peak => {
            for region in status.values_mut() {
                region.consumption *= 1.1 + rng.random::<f64>() * 0.1;
                region.frequency -= 0.05 + rng.random::<f64>() * 0.1;
                region.refresh_balance();
            }
        }
        Scenario::RenewableSurplus => {
            let names: Vec<String> = status.keys().cloned().collect();
            if names.len() < 2 {
                return Err(format!(
                    "renewable surplus needs at least 2 regions, got {}",
                    names.len()
                ));
            }
            // Two distinct regions, uniform without replacement.
            let first = rng.random_range(0..names.len());
            let mut second = rng.random_range(0..names.len() - 1);
            if second >= first {
                second += 1;
            }
            for idx in [first, second] {
                let region = status
                    .get_mut(&names[idx])
                    .ok_or_else(|| format!("region `{}` vanished mid-scenario", names[idx]))?;
                region.generation *= 1.15 + rng.random::<f64>() * 0.15;
                region.frequency += 0.05 + rng.random::<f64>() * 0.1;
                region.refresh_balance();
            }
        }
        Scenario::Outage => {
            let names: Vec<String> = status.keys().cloned().collect();
            if names.is_empty() {
                return Err("outage needs at least 1 region".to_string());
            }
            let struck = &names[rng.random_range(0..names.len())];
            let region = status
                .get_mut(struck)
                .ok_or_else(|| format!("region `{struck}` vanished mid-scenario"))?;
            region.generation *= 0.6 + rng.random::<f64>() * 0.2;
            region.frequency -= 0.2 + rng.random::<f64>() * 0.2;
            region.refresh_balance();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn two_regions() -> BTreeMap<String, RegionStatus> {
        BTreeMap::from([
            ("a".to_string(), RegionStatus::new(100.0, 80.0, 50.0)),
            ("b".to_string(), RegionStatus::new(50.0, 90.0, 49.9)),
        ])
    }

    #[test]
    fn from_name_is_lenient() {
        assert_eq!(Scenario::from_name("peak"), Scenario::Peak);
        assert_eq!(Scenario::from_name("outage"), Scenario::Outage);
        assert_eq!(Scenario::from_name("no-such-thing"), Scenario::Normal);
        assert_eq!(Scenario::from_name(""), Scenario::Normal);
    }

    #[test]
    fn names_round_trip() {
        for name in Scenario::NAMES {
            assert_eq!(Scenario::from_name(name).name(), name);
        }
    }

    #[test]
    fn normal_leaves_snapshot_untouched() {
        let mut status = two_regions();
        let before = status.clone();
        let mut rng = StdRng::seed_from_u64(7);
        apply_scenario(&mut status, Scenario::Normal, &mut rng).unwrap();
        assert_eq!(status, before);
    }

    #[test]
    fn peak_raises_consumption_and_drops_frequency() {
        let before = two_regions();
        let mut status = before.clone();
        let mut rng = StdRng::seed_from_u64(7);
        apply_scenario(&mut status, Scenario::Peak, &mut rng).unwrap();
        for (name, region) in &status {
            let original = &before[name];
            let factor = region.consumption / original.consumption;
            assert!((1.1..=1.2).contains(&factor), "{name}: factor {factor}");
            assert!(region.frequency < original.frequency);
            assert_eq!(region.balance, region.generation - region.consumption);
        }
    }

    #[test]
    fn outage_cuts_generation_in_exactly_one_region() {
        let before = two_regions();
        let mut status = before.clone();
        let mut rng = StdRng::seed_from_u64(7);
        apply_scenario(&mut status, Scenario::Outage, &mut rng).unwrap();
        let struck: Vec<&String> = status
            .iter()
            .filter(|(name, region)| region.generation < before[name.as_str()].generation)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(struck.len(), 1, "one region loses generation");
        let region = &status[struck[0]];
        let factor = region.generation / before[struck[0]].generation;
        assert!((0.6..=0.8).contains(&factor), "factor {factor}");
        assert!(region.frequency < before[struck[0]].frequency);
    }

    #[test]
    fn outage_on_single_region_strikes_it() {
        let mut status = BTreeMap::from([(
            "only".to_string(),
            RegionStatus::new(100.0, 80.0, 50.0),
        )]);
        let mut rng = StdRng::seed_from_u64(7);
        apply_scenario(&mut status, Scenario::Outage, &mut rng).unwrap();
        assert!(status["only"].generation < 100.0);
    }

    #[test]
    fn renewable_surplus_boosts_exactly_two_regions() {
        let mut status = BTreeMap::from([
            ("a".to_string(), RegionStatus::new(100.0, 80.0, 50.0)),
            ("b".to_string(), RegionStatus::new(50.0, 90.0, 49.9)),
            ("c".to_string(), RegionStatus::new(70.0, 70.0, 50.0)),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        apply_scenario(&mut status, Scenario::RenewableSurplus, &mut rng).unwrap();
        let boosted = status
            .iter()
            .filter(|(name, region)| {
                let original: f64 = match name.as_str() {
                    "a" => 100.0,
                    "b" => 50.0,
                    _ => 70.0,
                };
                region.generation > original
            })
            .count();
        assert_eq!(boosted, 2);
    }

    #[test]
    fn renewable_surplus_needs_two_regions() {
        let mut status = BTreeMap::from([(
            "only".to_string(),
            RegionStatus::new(100.0, 80.0, 50.0),
        )]);
        let mut rng = StdRng::seed_from_u64(7);
        let err = apply_scenario(&mut status, Scenario::RenewableSurplus, &mut rng)
            .expect_err("one region cannot host a two-region surplus");
        assert!(err.contains("at least 2"));
    }

    #[test]
    fn outage_needs_a_region() {
        let mut status = BTreeMap::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(apply_scenario(&mut status, Scenario::Outage, &mut rng).is_err());
    }
}
