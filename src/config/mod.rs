use std::collections::HashSet;
#[cfg(feature = "toml")]
use std::fs;
#[cfg(feature = "toml")]
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{Level, event, instrument};

use crate::config::candidate::CandidateConfig;
use crate::config::error::UnifConfigError;
use crate::config::unification::UnificationConfig;
use crate::error::UnifError;
use crate::oracle::{BuiltinEvaluator, ModelMap, Oracles, Simplifier, SyntacticExplainer, TermEvaluator};
use crate::synthesis::Synthesis;
use crate::synthesis::builder::UnifParams;
use crate::term::{Symbol, Term};

pub mod candidate;
pub mod error;
pub mod unification;

/// The `[meta]` table. `log_level` is any name `tracing::Level` accepts,
/// case-insensitively.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MetaConfig {
    pub log_level: String,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO.to_string(),
        }
    }
}

impl MetaConfig {
    pub fn level(&self) -> Result<Level, UnifConfigError> {
        self.log_level
            .parse()
            .map_err(|_| UnifConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

/// This struct represents the serializable configuration found in a
/// sygus-unif .toml file: engine options plus a batch of candidates, each with
/// its input/output points and the conditions an enumerator produced for it.
/// [UnifConfig::solve] runs one round of the engine over it with the builtin
/// collaborators.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UnifConfig {
    #[serde(default)]
    pub meta: MetaConfig,
    #[serde(default)]
    pub unification: UnificationConfig,
    #[serde(default, rename = "candidate")]
    pub candidates: Vec<CandidateConfig>,
}

#[cfg(feature = "toml")]
impl UnifConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, UnifConfigError> {
        let s = fs::read_to_string(path)?;
        Ok(toml_edit::de::from_str(&s)?)
    }

    pub fn to_toml(&self) -> Result<String, UnifConfigError> {
        Ok(toml_edit::ser::to_string_pretty(self)?)
    }
}

impl UnifConfig {
    pub fn resolve(&self) -> Result<UnifParams, UnifError> {
        self.unification.resolve()
    }

    #[instrument(skip_all)]
    pub fn solve(&self) -> Result<Synthesis, UnifError> {
        let mut seen = HashSet::new();
        for c in &self.candidates {
            if !seen.insert(c.name.as_str()) {
                return Err(UnifConfigError::DuplicateCandidate(c.name.clone()).into());
            }
        }
        let mut unif = self.resolve()?.build();
        let mut model = ModelMap::default();
        for candidate in &self.candidates {
            let name = candidate.symbol();
            let registration = unif.register_candidate(name.clone(), candidate.graph()?);
            for lemma in registration.strategy_lemmas.values().flatten() {
                event!(Level::DEBUG, "Strategy lemma for {name}: {lemma}");
            }
            match candidate.default_solution()? {
                Some(default) => {
                    model.assign(name.clone(), default.clone());
                    model.assign(candidate.root.as_str(), default);
                }
                None if !unif.uses_unification(&name) => {
                    return Err(UnifConfigError::MissingDefault(candidate.name.clone()).into());
                }
                None => {}
            }
        }
        for candidate in &self.candidates {
            let name = candidate.symbol();
            if !unif.uses_unification(&name) {
                continue;
            }
            for point in &candidate.points {
                let output = point.output()?;
                let expected = BuiltinEvaluator.evaluate(&output, &point.args)?;
                let lemma = Term::eq(candidate.application(point), Term::constant(expected));
                let purified = {
                    let oracles = Oracles::new(&BuiltinEvaluator, &Simplifier, &model, &SyntacticExplainer);
                    unif.add_refinement_lemma(&lemma, &oracles)?
                };
                match purified.points.get(&name).and_then(|p| p.first()) {
                    Some(p) => {
                        model.assign(p.head.clone(), output);
                    }
                    None => event!(Level::WARN, "Skipping repeated point {lemma}"),
                }
            }
            let (enumerators, conditions) = candidate.conditions()?;
            unif.set_conditions(
                &Symbol::new(candidate.root.as_str()),
                candidate.guard()?,
                enumerators,
                conditions,
            )?;
        }
        let oracles = Oracles::new(&BuiltinEvaluator, &Simplifier, &model, &SyntacticExplainer);
        unif.construct_solutions(&oracles)
    }
}
