//! Run Configuration
//!
//! File paths plus the two fixed codings the Data Preparer needs: the
//! north port-group set (region derivation) and the deterministic pcgroup
//! ordering (ordinal recode). Loaded once from JSON at startup and never
//! mutated during a run.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Process-wide configuration for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Metric table CSV: y, period, pcgroup, N, ed, nc_weighted, m_weighted, ...
    pub metric_table: PathBuf,

    /// Closure-event table CSV: y, pcgroup, days.closed
    pub closure_table: PathBuf,

    /// Externally maintained significance annotations CSV:
    /// season, metric, variable, sig
    pub significance_table: PathBuf,

    /// Output CSV path
    pub output: PathBuf,

    /// Port groups coded as "North"; everything else is "Central".
    pub north_groups: Vec<String>,

    /// Fixed ordering used to recode pcgroup to an ordinal 1..K.
    /// Participates in continuous-style rescaling downstream, so the order
    /// must be stable across runs.
    pub pcgroup_order: Vec<String>,
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: PipelineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the ordinal recode ambiguous.
    fn validate(&self) -> Result<()> {
        if self.pcgroup_order.is_empty() {
            anyhow::bail!("pcgroup_order must not be empty");
        }

        let mut seen = std::collections::HashSet::new();
        for group in &self.pcgroup_order {
            if !seen.insert(group.as_str()) {
                anyhow::bail!("pcgroup_order contains duplicate entry '{}'", group);
            }
        }

        for group in &self.north_groups {
            if !self.pcgroup_order.iter().any(|g| g == group) {
                anyhow::bail!(
                    "north_groups entry '{}' is not present in pcgroup_order",
                    group
                );
            }
        }

        Ok(())
    }
}
