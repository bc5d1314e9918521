//! Data Preparation
//!
//! Loads the raw metric and closure-event tables with Polars, derives the
//! categorical predictors (region, closure-duration bucket), recodes the
//! port group to a deterministic ordinal code, and splits the joined rows
//! into the two season partitions.
//!
//! The input tables are never mutated; preparation produces two immutable
//! partition frames consumed read-only by the Standardizer.

use crate::config::PipelineConfig;
use crate::error::ConfigError;
use crate::models::Season;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

/// The two immutable season partitions of the joined metric table.
pub struct PreparedData {
    pub early: DataFrame,
    pub late: DataFrame,
}

impl PreparedData {
    /// Load both input CSVs and run the full preparation.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        println!("Loading metric table: {:?}", config.metric_table);
        let metrics = read_csv(&config.metric_table)?;
        println!("  Metric rows: {}", metrics.height());

        println!("Loading closure table: {:?}", config.closure_table);
        let closures = read_csv(&config.closure_table)?;
        println!("  Closure rows: {}", closures.height());

        Self::prepare(metrics, closures, config)
    }

    /// Join, derive, recode, and partition. Pure with respect to its
    /// inputs; exposed separately from `load` so tests can feed in-memory
    /// frames.
    pub fn prepare(
        metrics: DataFrame,
        closures: DataFrame,
        config: &PipelineConfig,
    ) -> Result<Self> {
        // Port-group codes can look numeric in raw CSVs; keys must agree
        // on type for the join.
        let metrics = normalize_pcgroup(metrics)?;
        let closures = normalize_pcgroup(closures)?;

        let joined = metrics
            .clone()
            .lazy()
            .join(
                closures.lazy(),
                [col("y"), col("pcgroup")],
                [col("y"), col("pcgroup")],
                JoinArgs::new(JoinType::Left),
            )
            .collect()
            .context("Failed to join closure table onto metric table")?;

        let missing_closure = joined
            .column("days.closed")
            .context("Closure table is missing the days.closed column")?
            .null_count();
        if missing_closure > 0 {
            // Missing closure data propagates as nulls; the fit stage
            // drops incomplete rows under its own missing-data policy.
            eprintln!(
                "Warning: {} metric rows have no matching closure data (y, pcgroup)",
                missing_closure
            );
        }

        let joined = joined
            .hstack(&[
                derive_region(&joined, config)?.into_column(),
                derive_closure_bucket(&joined)?.into_column(),
                derive_pcgroup_code(&joined, config)?.into_column(),
            ])
            .context("Failed to attach derived predictor columns")?;

        let (early, late) = partition_by_season(&joined)?;
        println!(
            "  Partitions: early={} rows, late={} rows",
            early.height(),
            late.height()
        );

        Ok(PreparedData { early, late })
    }

    pub fn partition(&self, season: Season) -> &DataFrame {
        match season {
            Season::Early => &self.early,
            Season::Late => &self.late,
        }
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))
}

fn normalize_pcgroup(df: DataFrame) -> Result<DataFrame> {
    df.lazy()
        .with_column(col("pcgroup").cast(DataType::String))
        .collect()
        .context("Failed to normalize pcgroup column to string")
}

/// `region` = "North" if the port group is in the fixed north set, else
/// "Central". Level order (North, Central) is the binary 0/1 convention
/// declared in the variable table.
fn derive_region(df: &DataFrame, config: &PipelineConfig) -> Result<Series> {
    let north: FxHashSet<&str> = config.north_groups.iter().map(|s| s.as_str()).collect();
    let pcgroups = df.column("pcgroup")?.str()?;

    let region: StringChunked = pcgroups
        .into_iter()
        .map(|opt| opt.map(|g| if north.contains(g) { "North" } else { "Central" }))
        .collect();

    Ok(region.into_series().with_name("region".into()))
}

/// Bucket days-closed into the three ordered closure-duration categories.
/// Rows with missing closure data stay null.
fn derive_closure_bucket(df: &DataFrame) -> Result<Series> {
    let days = df
        .column("days.closed")?
        .cast(&DataType::Int64)
        .context("days.closed is not numeric")?;
    let days = days.i64()?;

    let bucket: StringChunked = days
        .into_iter()
        .map(|opt| {
            opt.map(|d| {
                if d == 0 {
                    "none"
                } else if d < 50 {
                    "medium"
                } else {
                    "high"
                }
            })
        })
        .collect();

    Ok(bucket.into_series().with_name("closure_bucket".into()))
}

/// Recode the categorical port group to its ordinal position 1..K in the
/// configured order. The coding is deterministic by construction; a port
/// group outside the configured order is a fatal configuration error.
fn derive_pcgroup_code(df: &DataFrame, config: &PipelineConfig) -> Result<Series> {
    let order: FxHashMap<&str, f64> = config
        .pcgroup_order
        .iter()
        .enumerate()
        .map(|(idx, g)| (g.as_str(), (idx + 1) as f64))
        .collect();

    let pcgroups = df.column("pcgroup")?.str()?;
    let mut codes: Vec<Option<f64>> = Vec::with_capacity(df.height());

    for opt in pcgroups.into_iter() {
        match opt {
            Some(group) => {
                let code = order
                    .get(group)
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownPortGroup(group.to_string()))?;
                codes.push(Some(code));
            }
            None => codes.push(None),
        }
    }

    let series: Float64Chunked = codes.into_iter().collect();
    Ok(series.into_series().with_name("pcgroup_code".into()))
}

/// Split into exactly two season partitions, failing loudly on any period
/// value other than the two declared codes.
fn partition_by_season(df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
    let periods = df.column("period")?.str()?;

    for opt in periods.into_iter() {
        match opt {
            Some(code) => {
                Season::from_period(code)?;
            }
            None => {
                return Err(ConfigError::UnknownSeason("<null>".to_string()).into());
            }
        }
    }

    let early_mask: BooleanChunked = periods
        .into_iter()
        .map(|opt| opt.map(|code| code == "early"))
        .collect();
    let late_mask: BooleanChunked = periods
        .into_iter()
        .map(|opt| opt.map(|code| code == "late"))
        .collect();

    let early = df.filter(&early_mask)?;
    let late = df.filter(&late_mask)?;
    Ok((early, late))
}
