//! Standardizer
//!
//! Applies the Gelman rescaling rules to a fitted model's design and
//! refits to obtain standardized-scale coefficients:
//!
//!   - continuous: rescale to mean 0, standard deviation 0.5
//!   - binary: center the 0/1 indicator; the unit gap between the two
//!     levels is preserved
//!   - categorical (>2 levels): passed through unchanged
//!
//! Interaction columns are recomputed as products of the rescaled
//! components. The refit is a genuine re-estimation, not post-hoc
//! arithmetic on the original coefficients: the logit link is not linear,
//! so transformed-input coefficients cannot be derived from the raw fit.

use crate::design::{build_design, ColumnRole, DesignMatrix};
use crate::glm::{fit_glm, GlmFit};
use crate::models::ModelSpec;
use crate::variables::VariableKind;
use anyhow::{Context, Result};
use polars::prelude::DataFrame;

/// A model fit on the raw (unscaled) design. Owned input to the
/// Standardizer; read-only afterwards.
pub struct FittedModel {
    pub spec: ModelSpec,
    pub design: DesignMatrix,
    pub fit: GlmFit,
}

/// The same model refit after rescaling; its coefficients are the only
/// numbers that flow downstream.
pub struct StandardizedModel {
    pub spec: ModelSpec,
    pub design: DesignMatrix,
    pub fit: GlmFit,
}

/// Fit one model on its raw design.
pub fn fit_model(partition: &DataFrame, spec: &ModelSpec) -> Result<FittedModel> {
    let design = build_design(partition, spec)
        .with_context(|| format!("Failed to build design for {}", spec.label()))?;
    let fit = fit_glm(&design, spec.family())
        .with_context(|| format!("Failed to fit {}", spec.label()))?;

    Ok(FittedModel {
        spec: spec.clone(),
        design,
        fit,
    })
}

/// Rescale the fitted model's predictors and refit.
pub fn standardize(model: &FittedModel) -> Result<StandardizedModel> {
    let design = rescale_design(&model.design);
    let fit = fit_glm(&design, model.spec.family())
        .with_context(|| format!("Failed to refit standardized {}", model.spec.label()))?;

    Ok(StandardizedModel {
        spec: model.spec.clone(),
        design,
        fit,
    })
}

/// Apply the per-kind rescaling rules and rename columns to their
/// standardized-scale terms (z.*, c.*). Interactions are recomputed from
/// the already-rescaled components, which precede them in column order.
pub fn rescale_design(design: &DesignMatrix) -> DesignMatrix {
    let mut columns = design.columns.clone();

    for idx in 0..columns.len() {
        match columns[idx].role.clone() {
            ColumnRole::Intercept => {}
            ColumnRole::Main(VariableKind::Continuous) => {
                let (mean, sd) = mean_sd(&columns[idx].values);
                for value in columns[idx].values.iter_mut() {
                    *value -= mean;
                    if sd > 0.0 {
                        *value /= 2.0 * sd;
                    }
                }
                let name = format!("z.{}", columns[idx].name);
                columns[idx].name = name;
            }
            ColumnRole::Main(VariableKind::Binary) => {
                let mean =
                    columns[idx].values.iter().sum::<f64>() / columns[idx].values.len() as f64;
                for value in columns[idx].values.iter_mut() {
                    *value -= mean;
                }
                let name = format!("c.{}", columns[idx].name);
                columns[idx].name = name;
            }
            ColumnRole::Main(VariableKind::CategoricalUnchanged) => {}
            ColumnRole::Interaction { left, right } => {
                let values: Vec<f64> = columns[left]
                    .values
                    .iter()
                    .zip(&columns[right].values)
                    .map(|(a, b)| a * b)
                    .collect();
                let name = format!("{}:{}", columns[left].name, columns[right].name);
                columns[idx].values = values;
                columns[idx].name = name;
            }
        }
    }

    DesignMatrix {
        response: design.response.clone(),
        columns,
    }
}

/// Sample mean and standard deviation (n - 1 denominator).
fn mean_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (ss / (n - 1.0)).sqrt())
}
