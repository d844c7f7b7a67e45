//! Post-transform consistency checks.
//!
//! All checks return [`AoNormError::Consistency`] on failure. Whether such a failure is fatal is
//! left to the caller.

use crate::convention::orbital_map::OrbitalMap;
use crate::error::{ensure_config, AoNormError, AoNormResult};
use crate::sparse::{accumulate, CooMatrix};

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;

/// Converts a relative tolerance into the absolute one accepted by the checks in this module,
/// by scaling it with the largest $`|A_{ij}|`$ of `mat`.
pub fn relative_tolerance(mat: &CooMatrix<f64>, rtol: f64) -> f64 {
    rtol * mat.max_abs()
}

/// Checks that a matrix is symmetric within an absolute tolerance.
///
/// # Returns
///
/// The largest asymmetry $`|A_{ij} - A_{ji}|`$.
///
/// # Errors
///
/// Errors with [`AoNormError::Consistency`] if the matrix is not square or if its asymmetry
/// exceeds `tol`.
pub fn check_symmetric(mat: &CooMatrix<f64>, tol: f64) -> AoNormResult<f64> {
    let asym = mat.max_asymmetry().ok_or_else(|| {
        AoNormError::Consistency(format!(
            "A {} x {} matrix cannot be symmetric.",
            mat.shape().0,
            mat.shape().1
        ))
    })?;
    if asym > tol {
        Err(AoNormError::Consistency(format!(
            "Matrix asymmetry {asym:.3e} exceeds the tolerance {tol:.3e}."
        )))
    } else {
        Ok(asym)
    }
}

/// Checks that transforming a matrix forward and back reproduces it.
///
/// # Returns
///
/// The largest absolute element-wise deviation.
///
/// # Errors
///
/// Errors with [`AoNormError::Consistency`] if the deviation exceeds `tol`, or propagates the
/// error of either transform.
pub fn check_round_trip(map: &OrbitalMap, mat: &CooMatrix<f64>, tol: f64) -> AoNormResult<f64> {
    let back = map.inverse_transform_sparse(&map.transform_sparse(mat, None)?)?;
    let diff = accumulate(
        mat.shape(),
        mat.triplets()
            .chain(back.triplets().map(|(r, c, v)| (r, c, -v))),
    );
    let dev = diff.values().iter().map(|v| v.abs()).fold(0.0, f64::max);
    if dev > tol {
        Err(AoNormError::Consistency(format!(
            "Round-trip deviation {dev:.3e} exceeds the tolerance {tol:.3e}."
        )))
    } else {
        Ok(dev)
    }
}

/// Compares a reference overlap matrix with a computed one through the ratio
/// $`|\sum (S_{\mathrm{ref}} - S_{\mathrm{comp}})| / |\sum (S_{\mathrm{ref}} + S_{\mathrm{comp}})|`$.
///
/// # Arguments
///
/// * `reference` - The overlap matrix provided by the source, after canonicalisation.
/// * `computed` - The overlap matrix computed independently in the canonical convention.
/// * `tol` - The largest acceptable ratio.
///
/// # Returns
///
/// The ratio.
///
/// # Errors
///
/// Errors with [`AoNormError::Configuration`] if the shapes differ and with
/// [`AoNormError::Consistency`] if the ratio is not below `tol`.
pub fn overlap_check(
    reference: &CooMatrix<f64>,
    computed: &CooMatrix<f64>,
    tol: f64,
) -> AoNormResult<f64> {
    ensure_config!(
        reference.shape() == computed.shape(),
        "Overlap matrices of shapes {:?} and {:?} cannot be compared.",
        reference.shape(),
        computed.shape()
    );
    let (sum_ref, sum_comp) = (reference.sum(), computed.sum());
    let diff = (sum_ref - sum_comp).abs();
    let summ = (sum_ref + sum_comp).abs();
    let ratio = if diff == 0.0 { 0.0 } else { diff / summ };
    if ratio < tol {
        log::debug!("Overlap check passed: {diff:.6e} / {summ:.6e} = {ratio:.3e}.");
        Ok(ratio)
    } else {
        Err(AoNormError::Consistency(format!(
            "Overlap check failed: {diff:.6e} / {summ:.6e} is not below {tol:.3e}."
        )))
    }
}
