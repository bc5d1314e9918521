//! GLM refit engine
//!
//! Minimal iteratively reweighted least squares fitting for the two
//! family/link pairs the pipeline uses: Gaussian with identity link and
//! binomial with logit link. Linearly dependent design columns are detected
//! up front and reported as aliased coefficients rather than numbers.

pub mod family;
pub mod irls;

pub use family::Family;
pub use irls::{fit_glm, GlmFit};
