//! Fatal configuration errors
//!
//! These are the invariant violations that must abort the run before any
//! output is written. Everything else (missing closure data, unmatched
//! significance rows) is a non-fatal warning surfaced by the pipeline.

use thiserror::Error;

/// A violation of the pipeline's fixed configuration contract.
///
/// All variants are fatal: the run aborts and no output file is produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `period` column contained a value other than the two declared
    /// season codes.
    #[error("unknown season value '{0}' in period column (expected 'early' or 'late')")]
    UnknownSeason(String),

    /// A formula variable references a column that is absent from the
    /// prepared data.
    #[error("variable '{variable}' references column '{column}' which is absent from the prepared data")]
    MissingColumn { variable: String, column: String },

    /// A port group appeared in the data but not in the configured ordinal
    /// coding order.
    #[error("port group '{0}' has no position in the configured pcgroup order")]
    UnknownPortGroup(String),

    /// A variable declared binary realized a number of distinct values
    /// other than two in some partition.
    #[error("variable '{variable}' is declared binary but realizes {observed} distinct values")]
    BinaryArity { variable: String, observed: usize },

    /// A categorical column contained a level that was never declared.
    #[error("variable '{variable}' contains undeclared level '{level}'")]
    UnknownLevel { variable: String, level: String },

    /// An interaction term references a design column that the formula's
    /// main effects never produced.
    #[error("interaction component '{0}' does not name an expanded design column")]
    UnknownInteractionComponent(String),

    /// A standardized coefficient term has no entry in the display-name
    /// vocabulary.
    #[error("coefficient term '{0}' has no display-name mapping")]
    UnmappedTerm(String),

    /// The same (metric, season, variable) key was extracted twice.
    #[error("duplicate coefficient key: {metric} / {season} / {variable}")]
    DuplicateKey {
        metric: String,
        season: String,
        variable: String,
    },
}
