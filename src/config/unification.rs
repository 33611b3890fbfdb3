use serde::{Deserialize, Serialize};

use crate::error::UnifError;
use crate::synthesis::builder::{UnifParams, UnifParamsBuilder};

/// The `[unification]` table: which optional techniques the decision trees use.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct UnificationConfig {
    pub condition_pool: bool,
    pub return_value_pool: bool,
    pub repair_conditions: bool,
    pub heuristic_rebuild: bool,
    pub conditions_independent: bool,
}

impl Default for UnificationConfig {
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

impl UnificationConfig {
    pub fn resolve(&self) -> Result<UnifParams, UnifError> {
        let mut b = UnifParamsBuilder::default();
        b.condition_pool(self.condition_pool)
            .return_value_pool(self.return_value_pool)
            .repair_conditions(self.repair_conditions);
        b.heuristic_rebuild(self.heuristic_rebuild);
        b.conditions_independent(self.conditions_independent);
        Ok(b.build()?)
    }
}
