//! Variable Classifier
//!
//! Fixed table declaring, for every predictor a formula may use, its kind
//! (continuous / binary / categorical-unchanged), its source column in the
//! prepared data, and its declared levels where applicable.
//!
//! Classification is domain knowledge, not data inspection: a variable with
//! exactly two observed values in some partition can still be declared
//! categorical, and the Standardizer must follow the declaration, never the
//! observed value count.

/// How a predictor is rescaled before the standardized refit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// Numeric with more than two realized values: rescaled to mean 0,
    /// standard deviation 0.5.
    Continuous,

    /// Exactly two declared levels: recoded 0/1 in declared level order,
    /// then centered. The unit gap between the levels is preserved.
    Binary,

    /// More than two levels, non-numeric: passed through with the original
    /// treatment (dummy) encoding, no rescaling.
    CategoricalUnchanged,
}

/// One entry of the closed predictor vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    /// Term name used in model formulas ("D", "R", "N", "pcgroup").
    pub name: &'static str,

    /// Source column in the prepared data.
    pub column: &'static str,

    pub kind: VariableKind,

    /// Declared levels for binary/categorical variables, reference level
    /// first. Empty for continuous variables. Order matters for the binary
    /// 0/1 convention: first level maps to 0, second to 1.
    pub levels: &'static [&'static str],
}

/// The full project-wide predictor table. Hard-coded by design (see module
/// docs); consulted by the Standardizer before any rescaling.
pub const VARIABLES: &[Variable] = &[
    Variable {
        name: "D",
        column: "closure_bucket",
        kind: VariableKind::CategoricalUnchanged,
        levels: &["none", "medium", "high"],
    },
    Variable {
        name: "R",
        column: "region",
        kind: VariableKind::Binary,
        levels: &["North", "Central"],
    },
    Variable {
        name: "N",
        column: "N",
        kind: VariableKind::Continuous,
        levels: &[],
    },
    Variable {
        name: "pcgroup",
        column: "pcgroup_code",
        kind: VariableKind::Continuous,
        levels: &[],
    },
];

/// Look up a variable by its formula term name.
pub fn lookup(name: &str) -> Option<&'static Variable> {
    VARIABLES.iter().find(|v| v.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_variables() {
        assert_eq!(lookup("D").unwrap().kind, VariableKind::CategoricalUnchanged);
        assert_eq!(lookup("R").unwrap().kind, VariableKind::Binary);
        assert_eq!(lookup("N").unwrap().kind, VariableKind::Continuous);
        assert_eq!(lookup("pcgroup").unwrap().kind, VariableKind::Continuous);
        assert!(lookup("bogus").is_none());
    }

    #[test]
    fn test_binary_level_order_is_north_first() {
        // The Standardizer maps the first level to 0 and the second to 1
        // before centering, so this order is load-bearing.
        let region = lookup("R").unwrap();
        assert_eq!(region.levels, &["North", "Central"]);
    }

    #[test]
    fn test_closure_bucket_declared_categorical() {
        // Even though a partition can realize only two buckets, the
        // declaration stays categorical-unchanged.
        let d = lookup("D").unwrap();
        assert_eq!(d.kind, VariableKind::CategoricalUnchanged);
        assert_eq!(d.levels, &["none", "medium", "high"]);
    }
}
