use serde::{Deserialize, Serialize};

use crate::config::error::UnifConfigError;
use crate::strategy::{ConditionTemplate, StrategyGraph};
use crate::term::{Symbol, Term, Value};

/// One input/output example: the candidate applied to `args` must behave like
/// the program `output`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PointConfig {
    pub args: Vec<Value>,
    pub output: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub term: String,
    pub arg: String,
}

/// A `[[candidate]]` entry. Candidates with a `condition` enumerator are solved
/// by decision tree unification at `root`; the others take `default`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CandidateConfig {
    pub name: String,
    pub root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub points: Vec<PointConfig>,
}

impl CandidateConfig {
    pub fn symbol(&self) -> Symbol {
        Symbol::new(self.name.as_str())
    }

    pub fn graph(&self) -> Result<StrategyGraph, UnifConfigError> {
        let Some(condition) = &self.condition else {
            return Ok(StrategyGraph::new(self.root.as_str()));
        };
        let mut graph = StrategyGraph::recursive_ite(self.root.as_str(), condition.as_str());
        if let Some(template) = &self.template {
            graph = graph.with_template(
                condition.as_str(),
                ConditionTemplate {
                    term: template.term.parse()?,
                    arg: Symbol::new(template.arg.as_str()),
                },
            );
        }
        Ok(graph)
    }

    pub fn guard(&self) -> Result<Term, UnifConfigError> {
        match &self.guard {
            Some(g) => Ok(g.parse()?),
            None => Ok(Term::symbol(format!("{}_guard", self.name))),
        }
    }

    pub fn default_solution(&self) -> Result<Option<Term>, UnifConfigError> {
        Ok(self.default.as_deref().map(str::parse).transpose()?)
    }

    /// Enumerator names `<condition>_<i>` paired with the parsed conditions.
    pub fn conditions(&self) -> Result<(Vec<Symbol>, Vec<Term>), UnifConfigError> {
        let prefix = self.condition.as_deref().unwrap_or(self.name.as_str());
        let terms = self
            .conditions
            .iter()
            .map(|c| c.parse())
            .collect::<Result<Vec<Term>, _>>()?;
        let enumerators = (0..terms.len())
            .map(|i| Symbol::new(format!("{prefix}_{i}")))
            .collect();
        Ok((enumerators, terms))
    }

    pub fn application(&self, point: &PointConfig) -> Term {
        Term::eval(self.symbol(), point.args.iter().copied().map(Term::constant).collect())
    }
}

impl PointConfig {
    pub fn output(&self) -> Result<Term, UnifConfigError> {
        Ok(self.output.parse()?)
    }
}
