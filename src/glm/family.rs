//! Distribution families
//!
//! Each family is paired with its canonical link: Gaussian/identity and
//! binomial/logit. The closed pairing keeps the solver free of runtime
//! link dispatch.

use anyhow::Result;

/// Fitted means are clamped away from the logistic boundaries.
const MU_EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Identity link; IRLS reduces to ordinary least squares.
    Gaussian,
    /// Logit link; the response is a proportion in [0, 1].
    Binomial,
}

impl Family {
    pub fn name(&self) -> &'static str {
        match self {
            Family::Gaussian => "gaussian",
            Family::Binomial => "binomial",
        }
    }

    /// Link function g(mu).
    pub fn link(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => mu,
            Family::Binomial => {
                let mu = mu.clamp(MU_EPS, 1.0 - MU_EPS);
                (mu / (1.0 - mu)).ln()
            }
        }
    }

    /// Inverse link g^-1(eta).
    pub fn mean(&self, eta: f64) -> f64 {
        match self {
            Family::Gaussian => eta,
            Family::Binomial => 1.0 / (1.0 + (-eta).exp()),
        }
    }

    /// Variance function V(mu).
    pub fn variance(&self, mu: f64) -> f64 {
        match self {
            Family::Gaussian => 1.0,
            Family::Binomial => {
                let mu = mu.clamp(MU_EPS, 1.0 - MU_EPS);
                mu * (1.0 - mu)
            }
        }
    }

    /// Starting mean for IRLS.
    pub fn initialize(&self, y: f64) -> f64 {
        match self {
            Family::Gaussian => y,
            // Shrink toward 0.5 so boundary observations start off the rails.
            Family::Binomial => (y + 0.5) / 2.0,
        }
    }

    /// Reject responses outside the family's support before fitting.
    pub fn validate_response(&self, y: &[f64]) -> Result<()> {
        if let Family::Binomial = self {
            for (idx, value) in y.iter().enumerate() {
                if !(0.0..=1.0).contains(value) {
                    anyhow::bail!(
                        "binomial response out of [0, 1] at row {}: {}",
                        idx,
                        value
                    );
                }
            }
        }
        Ok(())
    }
}
