//! Design matrix construction
//!
//! Expands a declarative formula against one season partition: intercept,
//! main effects in term order (categorical variables become treatment-coded
//! dummies against their first declared level), then interaction products.
//!
//! Rows with a missing response or missing predictor are dropped here;
//! upstream preparation deliberately keeps them as nulls so the drop policy
//! lives with the fit, not with the join.

use crate::error::ConfigError;
use crate::models::{ModelSpec, Term};
use crate::variables::{self, Variable, VariableKind};
use anyhow::{Context, Result};
use polars::prelude::*;

/// Provenance of one design column, used by the Standardizer to pick the
/// rescaling rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRole {
    Intercept,
    /// A main-effect column carrying its declared kind. Categorical dummies
    /// carry `CategoricalUnchanged`.
    Main(VariableKind),
    /// Product of two main-effect columns, stored by index so the product
    /// can be recomputed after rescaling.
    Interaction { left: usize, right: usize },
}

#[derive(Debug, Clone)]
pub struct DesignColumn {
    pub name: String,
    pub role: ColumnRole,
    pub values: Vec<f64>,
}

/// A fully expanded design: the response vector plus all predictor columns
/// including the intercept.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub response: Vec<f64>,
    pub columns: Vec<DesignColumn>,
}

impl DesignMatrix {
    pub fn n_rows(&self) -> usize {
        self.response.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

enum RawSource {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

/// Build the unscaled design matrix for one model over one partition.
pub fn build_design(partition: &DataFrame, spec: &ModelSpec) -> Result<DesignMatrix> {
    let response_raw = extract_numeric(partition, spec.response_column())
        .map_err(|_| ConfigError::MissingColumn {
            variable: spec.metric.display().to_string(),
            column: spec.response_column().to_string(),
        })?;

    // Resolve main-effect variables and pull their source columns.
    let mut mains: Vec<(&'static Variable, RawSource)> = Vec::new();
    for term in &spec.terms {
        if let Term::Main(name) = term {
            let var = variables::lookup(name).ok_or_else(|| ConfigError::MissingColumn {
                variable: name.to_string(),
                column: "<undeclared variable>".to_string(),
            })?;

            let source = match var.kind {
                VariableKind::Continuous => RawSource::Numeric(
                    extract_numeric(partition, var.column).map_err(|_| {
                        ConfigError::MissingColumn {
                            variable: var.name.to_string(),
                            column: var.column.to_string(),
                        }
                    })?,
                ),
                VariableKind::Binary | VariableKind::CategoricalUnchanged => RawSource::Text(
                    extract_text(partition, var.column).map_err(|_| {
                        ConfigError::MissingColumn {
                            variable: var.name.to_string(),
                            column: var.column.to_string(),
                        }
                    })?,
                ),
            };
            mains.push((var, source));
        }
    }

    // Complete-case mask over response and every predictor source.
    let n_total = partition.height();
    let mut keep = vec![true; n_total];
    for (idx, value) in response_raw.iter().enumerate() {
        if value.is_none() {
            keep[idx] = false;
        }
    }
    for (_, source) in &mains {
        match source {
            RawSource::Numeric(values) => {
                for (idx, value) in values.iter().enumerate() {
                    if value.is_none() {
                        keep[idx] = false;
                    }
                }
            }
            RawSource::Text(values) => {
                for (idx, value) in values.iter().enumerate() {
                    if value.is_none() {
                        keep[idx] = false;
                    }
                }
            }
        }
    }

    let response: Vec<f64> = response_raw
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(v, _)| v.unwrap())
        .collect();

    let mut columns = vec![DesignColumn {
        name: "(Intercept)".to_string(),
        role: ColumnRole::Intercept,
        values: vec![1.0; response.len()],
    }];

    for (var, source) in &mains {
        match (var.kind, source) {
            (VariableKind::Continuous, RawSource::Numeric(values)) => {
                let kept: Vec<f64> = values
                    .iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|(v, _)| v.unwrap())
                    .collect();
                columns.push(DesignColumn {
                    name: var.name.to_string(),
                    role: ColumnRole::Main(VariableKind::Continuous),
                    values: kept,
                });
            }
            (VariableKind::Binary, RawSource::Text(values)) => {
                let kept: Vec<&str> = values
                    .iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|(v, _)| v.as_deref().unwrap())
                    .collect();
                columns.push(DesignColumn {
                    name: var.name.to_string(),
                    role: ColumnRole::Main(VariableKind::Binary),
                    values: encode_binary(var, &kept)?,
                });
            }
            (VariableKind::CategoricalUnchanged, RawSource::Text(values)) => {
                let kept: Vec<&str> = values
                    .iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|(v, _)| v.as_deref().unwrap())
                    .collect();
                for (level, dummy) in encode_treatment(var, &kept)? {
                    columns.push(DesignColumn {
                        name: format!("{}{}", var.name, level),
                        role: ColumnRole::Main(VariableKind::CategoricalUnchanged),
                        values: dummy,
                    });
                }
            }
            _ => unreachable!("source type is chosen by variable kind"),
        }
    }

    // Interactions last, referencing the expanded main columns by name.
    for term in &spec.terms {
        if let Term::Interaction(left, right) = term {
            let left_idx = columns
                .iter()
                .position(|c| c.name == *left)
                .ok_or_else(|| ConfigError::UnknownInteractionComponent(left.to_string()))?;
            let right_idx = columns
                .iter()
                .position(|c| c.name == *right)
                .ok_or_else(|| ConfigError::UnknownInteractionComponent(right.to_string()))?;

            let values: Vec<f64> = columns[left_idx]
                .values
                .iter()
                .zip(&columns[right_idx].values)
                .map(|(a, b)| a * b)
                .collect();

            columns.push(DesignColumn {
                name: format!("{}:{}", left, right),
                role: ColumnRole::Interaction {
                    left: left_idx,
                    right: right_idx,
                },
                values,
            });
        }
    }

    Ok(DesignMatrix { response, columns })
}

/// 0/1 recode in declared level order, with the explicit arity guard: a
/// binary column realizing anything outside its two declared levels fails
/// fast rather than falling through to continuous-style rescaling.
fn encode_binary(var: &Variable, values: &[&str]) -> Result<Vec<f64>> {
    let mut distinct: Vec<&str> = Vec::new();
    for value in values {
        if !distinct.contains(value) {
            distinct.push(value);
        }
    }
    if distinct.len() > 2 {
        return Err(ConfigError::BinaryArity {
            variable: var.name.to_string(),
            observed: distinct.len(),
        }
        .into());
    }

    values
        .iter()
        .map(|value| match var.levels.iter().position(|l| l == value) {
            Some(idx) => Ok(idx as f64),
            None => Err(ConfigError::UnknownLevel {
                variable: var.name.to_string(),
                level: value.to_string(),
            }
            .into()),
        })
        .collect()
}

/// Treatment coding against the first declared level. Every non-reference
/// level gets a dummy column even when unrealized in the partition; an
/// all-zero dummy is aliased at fit time and its coefficient is dropped.
fn encode_treatment<'a>(
    var: &'a Variable,
    values: &[&str],
) -> Result<Vec<(&'a str, Vec<f64>)>> {
    for value in values {
        if !var.levels.contains(value) {
            return Err(ConfigError::UnknownLevel {
                variable: var.name.to_string(),
                level: value.to_string(),
            }
            .into());
        }
    }

    Ok(var.levels[1..]
        .iter()
        .map(|level| {
            let dummy: Vec<f64> = values
                .iter()
                .map(|v| if v == level { 1.0 } else { 0.0 })
                .collect();
            (*level, dummy)
        })
        .collect())
}

fn extract_numeric(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    Ok(column.f64()?.into_iter().collect())
}

fn extract_text(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?;
    let values = column
        .str()
        .with_context(|| format!("Column '{}' is not string typed", name))?;
    Ok(values
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, Season};

    fn partition() -> DataFrame {
        df!(
            "ed" => [0.4, 0.5, 0.6, 0.7],
            "nc_weighted" => [0.3, 0.35, 0.4, 0.45],
            "m_weighted" => [0.1, 0.12, 0.14, 0.16],
            "N" => [10i64, 20, 30, 40],
            "pcgroup_code" => [1.0, 2.0, 3.0, 4.0],
            "region" => ["North", "North", "Central", "Central"],
            "closure_bucket" => ["none", "medium", "high", "none"],
        )
        .unwrap()
    }

    fn spec(terms: Vec<Term>) -> ModelSpec {
        ModelSpec {
            metric: Metric::EdgeDensity,
            season: Season::Early,
            terms,
        }
    }

    #[test]
    fn test_expansion_order_and_names() {
        let spec = spec(vec![
            Term::Main("D"),
            Term::Main("R"),
            Term::Main("N"),
            Term::Main("pcgroup"),
            Term::Interaction("Dhigh", "R"),
        ]);
        let design = build_design(&partition(), &spec).unwrap();

        let names: Vec<&str> = design.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["(Intercept)", "Dmedium", "Dhigh", "R", "N", "pcgroup", "Dhigh:R"]
        );
    }

    #[test]
    fn test_dummy_and_binary_codes() {
        let spec = spec(vec![Term::Main("D"), Term::Main("R")]);
        let design = build_design(&partition(), &spec).unwrap();

        let dmedium = &design.columns[design.column_index("Dmedium").unwrap()];
        assert_eq!(dmedium.values, vec![0.0, 1.0, 0.0, 0.0]);

        let dhigh = &design.columns[design.column_index("Dhigh").unwrap()];
        assert_eq!(dhigh.values, vec![0.0, 0.0, 1.0, 0.0]);

        // North (first declared level) -> 0, Central -> 1.
        let region = &design.columns[design.column_index("R").unwrap()];
        assert_eq!(region.values, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_interaction_is_product() {
        let spec = spec(vec![
            Term::Main("D"),
            Term::Main("R"),
            Term::Interaction("Dhigh", "R"),
        ]);
        let design = build_design(&partition(), &spec).unwrap();
        let product = &design.columns[design.column_index("Dhigh:R").unwrap()];
        assert_eq!(product.values, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_column_is_config_error() {
        let df = df!(
            "ed" => [0.4, 0.5],
            "N" => [10i64, 20],
        )
        .unwrap();
        let spec = spec(vec![Term::Main("R")]);
        assert!(build_design(&df, &spec).is_err());
    }

    #[test]
    fn test_binary_arity_guard() {
        let df = df!(
            "ed" => [0.4, 0.5, 0.6],
            "region" => ["North", "Central", "Offshore"],
        )
        .unwrap();
        let spec = spec(vec![Term::Main("R")]);
        let err = build_design(&df, &spec).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::BinaryArity { .. }));
    }

    #[test]
    fn test_undeclared_level_rejected() {
        let df = df!(
            "ed" => [0.4, 0.5],
            "closure_bucket" => ["none", "extreme"],
        )
        .unwrap();
        let spec = spec(vec![Term::Main("D")]);
        let err = build_design(&df, &spec).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::UnknownLevel { .. }));
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let df = df!(
            "ed" => [Some(0.4), Some(0.5), None],
            "closure_bucket" => [Some("none"), None, Some("high")],
        )
        .unwrap();
        let spec = spec(vec![Term::Main("D")]);
        let design = build_design(&df, &spec).unwrap();
        assert_eq!(design.n_rows(), 1);
        assert_eq!(design.response, vec![0.4]);
    }
}
