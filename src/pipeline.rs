//! Pipeline coordinator
//!
//! Runs the full standardization-and-aggregation sequence: prepare data,
//! fit and standardize each declared model in order, extract and aggregate
//! coefficients, merge significance annotations, and write the output CSV.
//!
//! Fully sequential; the declared model order fixes the output row order,
//! so repeated runs on identical input produce byte-identical output. Any
//! fatal error aborts before the writer runs, so no partial file is ever
//! produced.

use crate::aggregate::aggregate;
use crate::config::PipelineConfig;
use crate::data::PreparedData;
use crate::extract::extract;
use crate::merge::{load_significance, merge, OutputRow};
use crate::models::ModelTable;
use crate::standardize::{fit_model, standardize};
use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

pub struct Pipeline {
    config: PipelineConfig,
    models: ModelTable,
}

impl Pipeline {
    /// Pipeline over the standard six-model table.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config,
            models: ModelTable::standard()?,
        })
    }

    /// Pipeline over a caller-supplied model table (the table must already
    /// be validated).
    pub fn with_models(config: PipelineConfig, models: ModelTable) -> Self {
        Self { config, models }
    }

    /// Run end to end and return the written table.
    pub fn run(&self) -> Result<DataFrame> {
        let data = PreparedData::load(&self.config)?;

        println!("Fitting {} models...", self.models.specs.len());
        let mut batches = Vec::with_capacity(self.models.specs.len());
        for spec in &self.models.specs {
            let partition = data.partition(spec.season);
            let fitted = fit_model(partition, spec)?;
            let standardized = standardize(&fitted)?;
            if !standardized.fit.converged {
                eprintln!(
                    "Warning: {} did not converge after {} iterations",
                    spec.label(),
                    standardized.fit.iterations
                );
            }

            let records = extract(&standardized)?;
            println!(
                "  {} ({}): {} coefficients",
                spec.label(),
                spec.family().name(),
                records.len()
            );
            batches.push(records);
        }

        let coefficients = aggregate(batches)?;
        println!("  Aggregated rows: {}", coefficients.len());

        println!(
            "Loading significance table: {:?}",
            self.config.significance_table
        );
        let significance = load_significance(&self.config.significance_table)?;
        let rows = merge(&coefficients, &significance);

        let mut output = output_frame(&rows)?;
        write_output(&mut output, &self.config.output)?;
        println!("Wrote {} rows to {:?}", output.height(), self.config.output);

        Ok(output)
    }
}

/// Assemble the output table in insertion order:
/// metric, season, variable, coefficients, sig, adj_x.
pub fn output_frame(rows: &[OutputRow]) -> Result<DataFrame> {
    let metrics: Vec<&str> = rows.iter().map(|r| r.metric.as_str()).collect();
    let seasons: Vec<&str> = rows.iter().map(|r| r.season.as_str()).collect();
    let variables: Vec<&str> = rows.iter().map(|r| r.variable.as_str()).collect();
    let coefficients: Vec<f64> = rows.iter().map(|r| r.coefficient).collect();
    let sigs: Vec<Option<&str>> = rows.iter().map(|r| r.sig.as_deref()).collect();
    let offsets: Vec<f64> = rows.iter().map(|r| r.label_offset).collect();

    df!(
        "metric" => metrics,
        "season" => seasons,
        "variable" => variables,
        "coefficients" => coefficients,
        "sig" => sigs,
        "adj_x" => offsets,
    )
    .context("Failed to assemble output frame")
}

fn write_output(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write output CSV: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_frame_schema_and_order() {
        let rows = vec![
            OutputRow {
                metric: "Edge Density".to_string(),
                season: "Early Season".to_string(),
                variable: "D (high)".to_string(),
                coefficient: -0.4,
                sig: Some("**".to_string()),
                label_offset: -0.55,
            },
            OutputRow {
                metric: "Modularity".to_string(),
                season: "Late Season".to_string(),
                variable: "Size".to_string(),
                coefficient: 0.2,
                sig: None,
                label_offset: 0.3,
            },
        ];

        let df = output_frame(&rows).unwrap();
        assert_eq!(
            df.get_column_names_str(),
            vec!["metric", "season", "variable", "coefficients", "sig", "adj_x"]
        );
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.column("metric").unwrap().str().unwrap().get(0),
            Some("Edge Density")
        );
        assert_eq!(df.column("sig").unwrap().null_count(), 1);
    }
}
