//! Coefficient Extraction
//!
//! Converts a standardized model's coefficient vector into canonical
//! records: the intercept is dropped unconditionally, aliased coefficients
//! are absent (never zero or null), and every surviving internal term is
//! remapped to the fixed human-readable display vocabulary. A term with no
//! mapping entry is a configuration error, not a pass-through.

use crate::error::ConfigError;
use crate::standardize::StandardizedModel;
use anyhow::Result;

/// One row of the canonical coefficient schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientRecord {
    pub metric: String,
    pub season: String,
    pub variable: String,
    pub coefficient: f64,
}

/// The closed internal-term -> display-name vocabulary. Display names are
/// independent of the model's internal encoding and must reproduce exactly.
const DISPLAY_NAMES: &[(&str, &str)] = &[
    ("Dmedium", "D (medium)"),
    ("Dhigh", "D (high)"),
    ("c.R", "R (Central)"),
    ("z.N", "Size"),
    ("z.pcgroup", "Port Group"),
    ("Dhigh:c.R", "D (high) : R (Central)"),
];

/// Display name for a standardized internal term, if declared.
pub fn display_name(term: &str) -> Option<&'static str> {
    DISPLAY_NAMES
        .iter()
        .find(|(internal, _)| *internal == term)
        .map(|(_, display)| *display)
}

/// Extract canonical records from one standardized model.
pub fn extract(model: &StandardizedModel) -> Result<Vec<CoefficientRecord>> {
    let metric = model.spec.metric.display();
    let season = model.spec.season.display();

    let mut records = Vec::new();
    for (name, coefficient) in model.fit.names.iter().zip(&model.fit.coefficients) {
        if name == "(Intercept)" {
            continue;
        }
        // Aliased terms are absent, by design.
        let Some(value) = coefficient else {
            continue;
        };

        let variable = display_name(name)
            .ok_or_else(|| ConfigError::UnmappedTerm(name.clone()))?;

        records.push(CoefficientRecord {
            metric: metric.to_string(),
            season: season.to_string(),
            variable: variable.to_string(),
            coefficient: *value,
        });
    }

    Ok(records)
}
