//! Significance Merge
//!
//! Left outer join of the externally maintained significance table onto
//! the aggregated coefficients, keyed on (metric, season, variable).
//! Coefficient rows without an annotation keep an absent marker; rows of
//! the significance table that match nothing are dropped from the output
//! but surfaced as consistency warnings. Also derives the plotting
//! label-offset field from the merged coefficient.

use crate::extract::CoefficientRecord;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;

/// One externally supplied annotation.
#[derive(Debug, Clone)]
pub struct SignificanceRecord {
    pub metric: String,
    pub season: String,
    pub variable: String,
    /// "", "*", "**", or "***".
    pub marker: String,
}

/// Final output row, written once.
#[derive(Debug, Clone)]
pub struct OutputRow {
    pub metric: String,
    pub season: String,
    pub variable: String,
    pub coefficient: f64,
    /// None when the coefficient has no annotation.
    pub sig: Option<String>,
    pub label_offset: f64,
}

/// Load the significance table from its CSV artifact
/// (columns: season, metric, variable, sig).
pub fn load_significance(path: &Path) -> Result<Vec<SignificanceRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load significance table: {:?}", path))?;

    let seasons = df.column("season")?.str()?;
    let metrics = df.column("metric")?.str()?;
    let variables = df.column("variable")?.str()?;
    let sigs = df.column("sig")?.cast(&DataType::String)?;
    let sigs = sigs.str()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(season), Some(metric), Some(variable)) =
            (seasons.get(idx), metrics.get(idx), variables.get(idx))
        else {
            anyhow::bail!("significance table row {} has a null key field", idx);
        };
        records.push(SignificanceRecord {
            metric: metric.to_string(),
            season: season.to_string(),
            variable: variable.to_string(),
            // Empty marker cells read back as null.
            marker: sigs.get(idx).unwrap_or("").to_string(),
        });
    }

    Ok(records)
}

/// Horizontal offset for coefficient labels on the downstream plot.
pub fn label_offset(coefficient: f64) -> f64 {
    if coefficient < 0.0 {
        coefficient - 0.15
    } else {
        coefficient + 0.1
    }
}

/// Left outer join: every coefficient row appears exactly once in the
/// output, annotated where a significance entry exists.
pub fn merge(
    coefficients: &[CoefficientRecord],
    significance: &[SignificanceRecord],
) -> Vec<OutputRow> {
    let mut index: FxHashMap<(&str, &str, &str), &str> = FxHashMap::default();
    for record in significance {
        let key = (
            record.metric.as_str(),
            record.season.as_str(),
            record.variable.as_str(),
        );
        if index.insert(key, record.marker.as_str()).is_some() {
            eprintln!(
                "Warning: duplicate significance entry for {} / {} / {}",
                record.metric, record.season, record.variable
            );
        }
    }

    let mut matched: FxHashMap<(&str, &str, &str), bool> =
        index.keys().map(|key| (*key, false)).collect();

    let rows: Vec<OutputRow> = coefficients
        .iter()
        .map(|record| {
            let key = (
                record.metric.as_str(),
                record.season.as_str(),
                record.variable.as_str(),
            );
            let sig = index.get(&key).map(|marker| {
                matched.insert(key, true);
                marker.to_string()
            });

            OutputRow {
                metric: record.metric.clone(),
                season: record.season.clone(),
                variable: record.variable.clone(),
                coefficient: record.coefficient,
                sig,
                label_offset: label_offset(record.coefficient),
            }
        })
        .collect();

    for (key, was_matched) in &matched {
        if !was_matched {
            eprintln!(
                "Warning: significance entry {} / {} / {} matches no coefficient row",
                key.0, key.1, key.2
            );
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn coef(metric: &str, season: &str, variable: &str, value: f64) -> CoefficientRecord {
        CoefficientRecord {
            metric: metric.to_string(),
            season: season.to_string(),
            variable: variable.to_string(),
            coefficient: value,
        }
    }

    fn sig(metric: &str, season: &str, variable: &str, marker: &str) -> SignificanceRecord {
        SignificanceRecord {
            metric: metric.to_string(),
            season: season.to_string(),
            variable: variable.to_string(),
            marker: marker.to_string(),
        }
    }

    #[test]
    fn test_label_offset_branches() {
        assert_relative_eq!(label_offset(-0.4), -0.55, epsilon = 1e-12);
        assert_relative_eq!(label_offset(0.2), 0.3, epsilon = 1e-12);
        assert_relative_eq!(label_offset(0.0), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_left_join_keeps_every_coefficient_row() {
        let coefs = vec![
            coef("Edge Density", "Early Season", "D (high)", -0.4),
            coef("Edge Density", "Early Season", "Size", 0.2),
        ];
        let sigs = vec![sig("Edge Density", "Early Season", "D (high)", "**")];

        let rows = merge(&coefs, &sigs);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sig.as_deref(), Some("**"));
        assert_eq!(rows[1].sig, None);
        assert_relative_eq!(rows[0].label_offset, -0.55, epsilon = 1e-12);
        assert_relative_eq!(rows[1].label_offset, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_unmatched_significance_rows_dropped() {
        let coefs = vec![coef("Modularity", "Late Season", "Size", 0.1)];
        let sigs = vec![
            sig("Modularity", "Late Season", "Size", "*"),
            sig("Modularity", "Late Season", "Port Group", "***"),
        ];

        let rows = merge(&coefs, &sigs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sig.as_deref(), Some("*"));
    }

    #[test]
    fn test_empty_marker_is_preserved_as_present() {
        let coefs = vec![coef("Modularity", "Late Season", "Size", 0.1)];
        let sigs = vec![sig("Modularity", "Late Season", "Size", "")];

        let rows = merge(&coefs, &sigs);
        // An empty marker is still an annotation; only a missing entry is
        // absent.
        assert_eq!(rows[0].sig.as_deref(), Some(""));
    }
}
