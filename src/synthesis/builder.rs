use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::synthesis::SygusUnif;

/// Switches of the unification engine.
#[derive(Clone, Debug, Builder, Deserialize, Serialize)]
#[builder(default)]
pub struct UnifParams {
    /// Fall back to earlier conditions of the candidate when the enumerated one
    /// does not separate a conflicting pair.
    pub condition_pool: bool,
    /// Try to merge conflicting points through a shared pooled output program
    /// before splitting them.
    pub return_value_pool: bool,
    /// Repair every enumerated condition against the pair it must separate,
    /// not only conditions with open constants.
    pub repair_conditions: bool,
    /// Rebuild a solved tree with the information-gain heuristic.
    pub heuristic_rebuild: bool,
    /// Use the pooled conditions as fixed trie levels instead of the
    /// incremental algorithm.
    pub conditions_independent: bool,
}

impl Default for UnifParams {
    fn default() -> Self {
        Self {
            condition_pool: true,
            return_value_pool: false,
            repair_conditions: false,
            heuristic_rebuild: false,
            conditions_independent: false,
        }
    }
}

impl UnifParams {
    pub fn build(&self) -> SygusUnif {
        SygusUnif::new(self.clone())
    }

    /// Whether conditions handed to the engine are retained in the candidate's pool.
    pub fn pools_conditions(&self) -> bool {
        self.condition_pool || self.conditions_independent
    }
}

#[cfg(test)]
mod tests {
    use crate::synthesis::builder::UnifParamsBuilder;

    #[test]
    fn builder_defaults() {
        let params = UnifParamsBuilder::default()
            .heuristic_rebuild(true)
            .build()
            .unwrap();
        assert!(params.condition_pool);
        assert!(params.heuristic_rebuild);
        assert!(!params.return_value_pool);
        assert!(params.pools_conditions());
    }
}
