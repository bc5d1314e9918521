//! Declarative model table
//!
//! One validated structure declaring, for every (metric, season)
//! combination, the response column, the GLM family, and the formula terms.
//! Built once at startup; the pipeline iterates it in declared order, which
//! fixes the output row order.

use crate::error::ConfigError;
use crate::glm::Family;
use crate::variables::{self, VariableKind};
use anyhow::Result;

/// Network metric modeled as the GLM response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    EdgeDensity,
    Centralization,
    Modularity,
}

impl Metric {
    /// Display name used in output rows and significance keys.
    pub fn display(&self) -> &'static str {
        match self {
            Metric::EdgeDensity => "Edge Density",
            Metric::Centralization => "Centralization",
            Metric::Modularity => "Modularity",
        }
    }

    /// Response column in the prepared metric table.
    pub fn response_column(&self) -> &'static str {
        match self {
            Metric::EdgeDensity => "ed",
            Metric::Centralization => "nc_weighted",
            Metric::Modularity => "m_weighted",
        }
    }

    /// Edge density is a proportion and is modeled on the logit scale;
    /// the weighted centralization and modularity scores are Gaussian.
    pub fn family(&self) -> Family {
        match self {
            Metric::EdgeDensity => Family::Binomial,
            Metric::Centralization | Metric::Modularity => Family::Gaussian,
        }
    }
}

/// Fishing season partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Early,
    Late,
}

impl Season {
    /// Display name used in output rows and significance keys.
    pub fn display(&self) -> &'static str {
        match self {
            Season::Early => "Early Season",
            Season::Late => "Late Season",
        }
    }

    /// Parse a `period` column code. Any other value is a fatal
    /// configuration error at the partition step.
    pub fn from_period(code: &str) -> Result<Self, ConfigError> {
        match code {
            "early" => Ok(Season::Early),
            "late" => Ok(Season::Late),
            other => Err(ConfigError::UnknownSeason(other.to_string())),
        }
    }
}

/// One formula term.
#[derive(Debug, Clone)]
pub enum Term {
    /// A main effect, named by its entry in the variable table.
    Main(&'static str),

    /// An interaction between two expanded design columns (raw names,
    /// e.g. "Dhigh" x "R").
    Interaction(&'static str, &'static str),
}

/// Formula and family for one (metric, season) model.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub metric: Metric,
    pub season: Season,
    pub terms: Vec<Term>,
}

impl ModelSpec {
    pub fn family(&self) -> Family {
        self.metric.family()
    }

    pub fn response_column(&self) -> &'static str {
        self.metric.response_column()
    }

    /// Label used in progress output.
    pub fn label(&self) -> String {
        format!("{} / {}", self.metric.display(), self.season.display())
    }
}

/// The declared model sequence. Output rows appear in exactly this order.
#[derive(Debug, Clone)]
pub struct ModelTable {
    pub specs: Vec<ModelSpec>,
}

impl ModelTable {
    /// The project's six models: each metric fit separately per season.
    ///
    /// All models share the closure-duration, region, size, and port-group
    /// main effects; the edge-density models additionally carry the
    /// high-closure x region interaction.
    pub fn standard() -> Result<Self> {
        let base = || {
            vec![
                Term::Main("D"),
                Term::Main("R"),
                Term::Main("N"),
                Term::Main("pcgroup"),
            ]
        };
        let with_interaction = || {
            let mut terms = base();
            terms.push(Term::Interaction("Dhigh", "R"));
            terms
        };

        let mut specs = Vec::new();
        for metric in [Metric::EdgeDensity, Metric::Centralization, Metric::Modularity] {
            for season in [Season::Early, Season::Late] {
                let terms = match metric {
                    Metric::EdgeDensity => with_interaction(),
                    _ => base(),
                };
                specs.push(ModelSpec { metric, season, terms });
            }
        }

        let table = ModelTable { specs };
        table.validate()?;
        Ok(table)
    }

    /// Check every term against the variable table before any data is
    /// touched. Interaction components must be producible by the declared
    /// main effects.
    pub fn validate(&self) -> Result<()> {
        for spec in &self.specs {
            let mut expanded: Vec<String> = Vec::new();

            for term in &spec.terms {
                if let Term::Main(name) = term {
                    let var = variables::lookup(name).ok_or_else(|| {
                        ConfigError::MissingColumn {
                            variable: name.to_string(),
                            column: "<undeclared variable>".to_string(),
                        }
                    })?;
                    match var.kind {
                        VariableKind::CategoricalUnchanged => {
                            // Treatment coding: one dummy per non-reference level.
                            for level in &var.levels[1..] {
                                expanded.push(format!("{}{}", var.name, level));
                            }
                        }
                        _ => expanded.push(var.name.to_string()),
                    }
                }
            }

            for term in &spec.terms {
                if let Term::Interaction(left, right) = term {
                    for component in [left, right] {
                        if !expanded.iter().any(|c| c == component) {
                            return Err(ConfigError::UnknownInteractionComponent(
                                component.to_string(),
                            )
                            .into());
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_has_six_models() {
        let table = ModelTable::standard().unwrap();
        assert_eq!(table.specs.len(), 6);
        // Declared order: metric-major, early before late.
        assert_eq!(table.specs[0].metric, Metric::EdgeDensity);
        assert_eq!(table.specs[0].season, Season::Early);
        assert_eq!(table.specs[5].metric, Metric::Modularity);
        assert_eq!(table.specs[5].season, Season::Late);
    }

    #[test]
    fn test_edge_density_models_carry_interaction() {
        let table = ModelTable::standard().unwrap();
        for spec in &table.specs {
            let has_interaction = spec
                .terms
                .iter()
                .any(|t| matches!(t, Term::Interaction(_, _)));
            assert_eq!(has_interaction, spec.metric == Metric::EdgeDensity);
        }
    }

    #[test]
    fn test_families() {
        assert_eq!(Metric::EdgeDensity.family(), Family::Binomial);
        assert_eq!(Metric::Centralization.family(), Family::Gaussian);
        assert_eq!(Metric::Modularity.family(), Family::Gaussian);
    }

    #[test]
    fn test_season_parsing_fails_loudly() {
        assert_eq!(Season::from_period("early").unwrap(), Season::Early);
        assert_eq!(Season::from_period("late").unwrap(), Season::Late);
        assert!(Season::from_period("mid").is_err());
    }

    #[test]
    fn test_undeclared_interaction_component_rejected() {
        let table = ModelTable {
            specs: vec![ModelSpec {
                metric: Metric::Modularity,
                season: Season::Early,
                terms: vec![Term::Main("R"), Term::Interaction("Dhigh", "R")],
            }],
        };
        // "Dhigh" requires the D main effect to be present.
        assert!(table.validate().is_err());
    }
}
