//! Small dense linear algebra over row-major `Vec<f64>` matrices.
//!
//! The Normal-linear posterior needs rank-one covariance recursions and a
//! Cholesky factor for multivariate-normal draws. Dimensions here are tiny
//! (the context length, typically 2-10), so a handful of explicit loops
//! beats pulling in a matrix crate.
//!
//! Conventions: a `d x d` matrix is a `Vec<f64>` of length `d*d`, row-major;
//! element `(i, j)` lives at `m[i * d + j]`.

use crate::SimError;

/// Dot product of two equal-length slices.
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    let mut s = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        s += x * y;
    }
    s
}

/// Matrix-vector product `m * x` for a row-major `d x d` matrix.
#[must_use]
pub fn mat_vec(m: &[f64], d: usize, x: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; d];
    for i in 0..d {
        let row = &m[i * d..(i + 1) * d];
        out[i] = dot(row, x);
    }
    out
}

/// Quadratic form `x^T m x`.
#[must_use]
pub fn quad_form(m: &[f64], d: usize, x: &[f64]) -> f64 {
    dot(x, &mat_vec(m, d, x))
}

/// Rank-one accumulate `m += x * x^T`.
pub fn outer_add(m: &mut [f64], d: usize, x: &[f64]) {
    for i in 0..d {
        for j in 0..d {
            m[i * d + j] += x[i] * x[j];
        }
    }
}

/// Sherman-Morrison update of a covariance matrix.
///
/// Given `cov = B` and a vector `c`, returns `(B^{-1} + c c^T)^{-1}` as
/// `B - (B c)(B c)^T / (1 + c^T B c)` without forming any inverse.
///
/// # Errors
///
/// `NotPositiveDefinite` if the denominator `1 + c^T B c` is not strictly
/// positive, which means the precision update would leave the positive
/// definite cone.
pub fn sherman_morrison(cov: &[f64], d: usize, c: &[f64]) -> Result<Vec<f64>, SimError> {
    let bc = mat_vec(cov, d, c);
    let denom = 1.0 + dot(c, &bc);
    if !denom.is_finite() || denom <= f64::EPSILON {
        return Err(SimError::NotPositiveDefinite);
    }
    let mut out = cov.to_vec();
    for i in 0..d {
        for j in 0..d {
            out[i * d + j] -= bc[i] * bc[j] / denom;
        }
    }
    Ok(out)
}

/// Lower-triangular Cholesky factor `L` with `L L^T = m`.
///
/// # Errors
///
/// `NotPositiveDefinite` if a pivot is non-positive or non-finite.
pub fn cholesky(m: &[f64], d: usize) -> Result<Vec<f64>, SimError> {
    let mut l = vec![0.0; d * d];
    for i in 0..d {
        for j in 0..=i {
            let mut s = m[i * d + j];
            for k in 0..j {
                s -= l[i * d + k] * l[j * d + k];
            }
            if i == j {
                if !s.is_finite() || s <= 0.0 {
                    return Err(SimError::NotPositiveDefinite);
                }
                l[i * d + i] = s.sqrt();
            } else {
                l[i * d + j] = s / l[j * d + j];
            }
        }
    }
    Ok(l)
}

/// Inverse of a symmetric positive definite matrix via its Cholesky factor.
///
/// # Errors
///
/// `NotPositiveDefinite` if the factorization fails.
pub fn invert_spd(m: &[f64], d: usize) -> Result<Vec<f64>, SimError> {
    let l = cholesky(m, d)?;
    let mut inv = vec![0.0; d * d];
    // Solve L L^T x = e_k for each basis column.
    for k in 0..d {
        let mut y = vec![0.0; d];
        for i in 0..d {
            let mut s = if i == k { 1.0 } else { 0.0 };
            for j in 0..i {
                s -= l[i * d + j] * y[j];
            }
            y[i] = s / l[i * d + i];
        }
        for i in (0..d).rev() {
            let mut s = y[i];
            for j in (i + 1)..d {
                s -= l[j * d + i] * inv[j * d + k];
            }
            inv[i * d + k] = s / l[i * d + i];
        }
    }
    Ok(inv)
}
