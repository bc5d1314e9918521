//! Standardized GLM Coefficient Pipeline
//!
//! Rescales the predictors of a batch of fitted port-network GLMs so that
//! coefficients on different measurement scales become comparable, then
//! assembles one tidy coefficient table with significance annotations and
//! plotting offsets.
//!
//! Module layout:
//! - `config`: run configuration (paths, north set, pcgroup ordering)
//! - `data`: loading, joining, derived predictors, season partitions
//! - `variables`: fixed predictor-kind declarations
//! - `models`: declarative (metric x season) model table
//! - `design` / `glm`: design expansion and IRLS fitting
//! - `standardize`: Gelman rescaling rules and the standardized refit
//! - `extract` / `aggregate` / `merge`: canonical records, union, and the
//!   significance left-join
//! - `pipeline`: sequential coordinator and CSV writer

pub mod aggregate;
pub mod config;
pub mod data;
pub mod design;
pub mod error;
pub mod extract;
pub mod glm;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod standardize;
pub mod variables;

// Re-export commonly used types
pub use aggregate::aggregate as aggregate_records;
pub use config::PipelineConfig;
pub use data::PreparedData;
pub use error::ConfigError;
pub use extract::{extract, CoefficientRecord};
pub use glm::{fit_glm, Family, GlmFit};
pub use merge::{label_offset, merge, OutputRow, SignificanceRecord};
pub use models::{Metric, ModelSpec, ModelTable, Season, Term};
pub use pipeline::Pipeline;
pub use standardize::{fit_model, standardize, FittedModel, StandardizedModel};
pub use variables::{Variable, VariableKind};
