//! Iteratively reweighted least squares
//!
//! Canonical-link IRLS over an expanded design matrix. Aliased columns
//! (linearly dependent on earlier columns) are excluded before iteration
//! and come back as `None` coefficients, matching the convention that
//! undefined terms are absent rather than zero.

use crate::design::DesignMatrix;
use crate::glm::Family;
use anyhow::Result;

const MAX_ITERATIONS: usize = 50;
const COEF_TOLERANCE: f64 = 1e-10;
const ALIAS_TOLERANCE: f64 = 1e-8;
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Result of one GLM fit. Coefficient order matches the design columns;
/// aliased columns hold `None`.
#[derive(Debug, Clone)]
pub struct GlmFit {
    pub names: Vec<String>,
    pub coefficients: Vec<Option<f64>>,
    pub converged: bool,
    pub iterations: usize,
}

impl GlmFit {
    /// Coefficient for a named design column, if defined.
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|idx| self.coefficients[idx])
    }
}

/// Fit a GLM to the design by IRLS.
pub fn fit_glm(design: &DesignMatrix, family: Family) -> Result<GlmFit> {
    let n = design.n_rows();
    if n == 0 {
        anyhow::bail!("cannot fit a model to zero complete rows");
    }
    family.validate_response(&design.response)?;

    let aliased = detect_aliased(design);
    let active: Vec<usize> = (0..design.columns.len())
        .filter(|idx| !aliased[*idx])
        .collect();
    let p = active.len();
    if p == 0 {
        anyhow::bail!("all design columns are aliased");
    }
    if p > n {
        anyhow::bail!(
            "more independent design columns ({}) than complete rows ({})",
            p,
            n
        );
    }

    let x: Vec<&[f64]> = active
        .iter()
        .map(|idx| design.columns[*idx].values.as_slice())
        .collect();
    let y = &design.response;

    let mut mu: Vec<f64> = y.iter().map(|&v| family.initialize(v)).collect();
    let mut eta: Vec<f64> = mu.iter().map(|&m| family.link(m)).collect();
    let mut beta = vec![0.0; p];
    let mut converged = false;
    let mut iterations = 0;

    for iter in 1..=MAX_ITERATIONS {
        iterations = iter;

        // Canonical-link weights and working response.
        let mut weights = Vec::with_capacity(n);
        let mut z = Vec::with_capacity(n);
        for i in 0..n {
            let v = family.variance(mu[i]);
            weights.push(v);
            z.push(eta[i] + (y[i] - mu[i]) / v);
        }

        let new_beta = solve_wls(&x, &z, &weights)?;

        let max_change = beta
            .iter()
            .zip(&new_beta)
            .map(|(old, new)| (old - new).abs())
            .fold(0.0_f64, f64::max);
        beta = new_beta;

        for i in 0..n {
            let mut value = 0.0;
            for (j, column) in x.iter().enumerate() {
                value += beta[j] * column[i];
            }
            eta[i] = value;
            mu[i] = family.mean(value);
        }

        if iter > 1 && max_change < COEF_TOLERANCE {
            converged = true;
            break;
        }
    }

    let mut coefficients = vec![None; design.columns.len()];
    for (slot, idx) in active.iter().enumerate() {
        coefficients[*idx] = Some(beta[slot]);
    }

    Ok(GlmFit {
        names: design.columns.iter().map(|c| c.name.clone()).collect(),
        coefficients,
        converged,
        iterations,
    })
}

/// Mark columns linearly dependent on earlier columns via modified
/// Gram-Schmidt. Column order is the formula expansion order, so earlier
/// terms win ties, matching the usual fitting convention.
fn detect_aliased(design: &DesignMatrix) -> Vec<bool> {
    let mut aliased = vec![false; design.columns.len()];
    let mut basis: Vec<Vec<f64>> = Vec::new();

    for (idx, column) in design.columns.iter().enumerate() {
        let mut v = column.values.clone();
        let original = norm(&v);
        if original == 0.0 {
            aliased[idx] = true;
            continue;
        }

        for b in &basis {
            let proj = dot(&v, b);
            for (vi, bi) in v.iter_mut().zip(b) {
                *vi -= proj * bi;
            }
        }

        let residual = norm(&v);
        if residual < ALIAS_TOLERANCE * original.max(1.0) {
            aliased[idx] = true;
        } else {
            for value in v.iter_mut() {
                *value /= residual;
            }
            basis.push(v);
        }
    }

    aliased
}

/// Solve the weighted normal equations (X'WX) b = X'Wz by Gaussian
/// elimination with partial pivoting. The design has already been reduced
/// to independent columns, so a vanishing pivot is a genuine failure.
fn solve_wls(x: &[&[f64]], z: &[f64], weights: &[f64]) -> Result<Vec<f64>> {
    let p = x.len();
    let n = z.len();

    let mut a = vec![vec![0.0; p + 1]; p];
    for j in 0..p {
        for k in j..p {
            let mut sum = 0.0;
            for i in 0..n {
                sum += weights[i] * x[j][i] * x[k][i];
            }
            a[j][k] = sum;
            a[k][j] = sum;
        }
        let mut rhs = 0.0;
        for i in 0..n {
            rhs += weights[i] * x[j][i] * z[i];
        }
        a[j][p] = rhs;
    }

    let scale = a
        .iter()
        .flat_map(|row| row[..p].iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));

    for col in 0..p {
        let pivot_row = (col..p)
            .max_by(|&r1, &r2| {
                a[r1][col]
                    .abs()
                    .partial_cmp(&a[r2][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot_row][col].abs() < PIVOT_TOLERANCE * scale.max(1.0) {
            anyhow::bail!("weighted design matrix is singular");
        }
        a.swap(col, pivot_row);

        for row in (col + 1)..p {
            let factor = a[row][col] / a[col][col];
            for k in col..=p {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut beta = vec![0.0; p];
    for col in (0..p).rev() {
        let mut value = a[col][p];
        for k in (col + 1)..p {
            value -= a[col][k] * beta[k];
        }
        beta[col] = value / a[col][col];
    }

    Ok(beta)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}
