use rustc_hash::FxHashMap;

use crate::control::RiccatiConfig;
use crate::error::Result;
use crate::models::Parameters;
use crate::policy::{solve_for_opt_policy, DominantFirmPolicy, InitialState};

/// Bit patterns of the parameters and the initial state
type Key = ([u64; 10], [u64; 3]);

fn key(params: &Parameters, initial: &InitialState) -> Key {
    (
        params.to_array().map(f64::to_bits),
        [initial.eta0, initial.leader_output, initial.fringe_output].map(f64::to_bits),
    )
}

/// Solved policies by input. Failed solves are not stored.
pub struct PolicyCache {
    config: RiccatiConfig,
    entries: FxHashMap<Key, DominantFirmPolicy>,
    hits: usize,
}

impl PolicyCache {
    pub fn new(config: RiccatiConfig) -> PolicyCache {
        PolicyCache {
            config,
            entries: FxHashMap::default(),
            hits: 0,
        }
    }

    pub fn get_or_solve(
        &mut self,
        params: &Parameters,
        initial: &InitialState,
    ) -> Result<&DominantFirmPolicy> {
        let key = key(params, initial);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            let policy = solve_for_opt_policy(params, initial, &self.config)?;
            self.entries.insert(key, policy);
        }
        Ok(&self.entries[&key])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_inputs_hit_the_cache() {
        let mut cache = PolicyCache::new(RiccatiConfig::default());
        let params = Parameters::default();
        let initial = InitialState::default();

        let first = *cache.get_or_solve(&params, &initial).unwrap();
        let second = *cache.get_or_solve(&params, &initial).unwrap();
        assert_eq!(first, second);
        assert_eq!(1, cache.len());
        assert_eq!(1, cache.hits());

        let other = Parameters {
            a0: 120.0,
            ..params
        };
        cache.get_or_solve(&other, &initial).unwrap();
        assert_eq!(2, cache.len());
        assert_eq!(1, cache.hits());
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = PolicyCache::new(RiccatiConfig::default());
        let params = Parameters {
            c: 0.0,
            ..Default::default()
        };
        assert!(cache.get_or_solve(&params, &InitialState::default()).is_err());
        assert!(cache.is_empty());
    }
}
