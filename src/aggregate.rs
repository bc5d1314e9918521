//! Aggregation
//!
//! Ordered, append-only union of coefficient records across all
//! (metric x season) models. Keys are distinct per model by construction,
//! so a duplicate (metric, season, variable) key means the same variable
//! was extracted twice for one model and the run must fail fast.

use crate::error::ConfigError;
use crate::extract::CoefficientRecord;
use anyhow::Result;
use rustc_hash::FxHashSet;

/// Concatenate per-model record batches in their declared order.
pub fn aggregate(batches: Vec<Vec<CoefficientRecord>>) -> Result<Vec<CoefficientRecord>> {
    let mut seen: FxHashSet<(String, String, String)> = FxHashSet::default();
    let mut records = Vec::new();

    for batch in batches {
        for record in batch {
            let key = (
                record.metric.clone(),
                record.season.clone(),
                record.variable.clone(),
            );
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateKey {
                    metric: record.metric,
                    season: record.season,
                    variable: record.variable,
                }
                .into());
            }
            records.push(record);
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(metric: &str, season: &str, variable: &str) -> CoefficientRecord {
        CoefficientRecord {
            metric: metric.to_string(),
            season: season.to_string(),
            variable: variable.to_string(),
            coefficient: 0.1,
        }
    }

    #[test]
    fn test_order_preserving_concatenation() {
        let a = vec![
            record("Edge Density", "Early Season", "D (high)"),
            record("Edge Density", "Early Season", "Size"),
        ];
        let b = vec![record("Modularity", "Late Season", "D (high)")];

        let merged = aggregate(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].metric, "Edge Density");
        assert_eq!(merged[2].metric, "Modularity");

        // Reversed batch order yields the same set of rows.
        let reversed = aggregate(vec![b, a]).unwrap();
        let mut keys: Vec<_> = merged
            .iter()
            .map(|r| (r.metric.clone(), r.season.clone(), r.variable.clone()))
            .collect();
        let mut reversed_keys: Vec<_> = reversed
            .iter()
            .map(|r| (r.metric.clone(), r.season.clone(), r.variable.clone()))
            .collect();
        keys.sort();
        reversed_keys.sort();
        assert_eq!(keys, reversed_keys);
    }

    #[test]
    fn test_duplicate_key_fails_fast() {
        let a = vec![record("Edge Density", "Early Season", "D (high)")];
        let b = vec![record("Edge Density", "Early Season", "D (high)")];
        let err = aggregate(vec![a, b]).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::DuplicateKey { .. }));
    }

    #[test]
    fn test_same_variable_across_models_is_fine() {
        let a = vec![record("Edge Density", "Early Season", "D (high)")];
        let b = vec![record("Edge Density", "Late Season", "D (high)")];
        let c = vec![record("Modularity", "Early Season", "D (high)")];
        assert_eq!(aggregate(vec![a, b, c]).unwrap().len(), 3);
    }
}
