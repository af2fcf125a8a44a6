//! Least-squares solves for the orbital models
//!
//! Both paths go through an SVD of the NaN-filtered system. Singular values
//! at or below `rcond * max(singular values)` are treated as zero, which
//! yields the minimum-norm solution when the system is rank deficient.

use crate::types::{OrbitalError, OrbitalResult};
use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Relative singular value cutoff for the network pseudo-inverse
pub const NETWORK_RCOND: f64 = 1e-6;

/// Rows of the design matrix and observations that carry valid data
pub fn filter_nan_rows(dm: ArrayView2<f64>, obs: ArrayView1<f64>) -> OrbitalResult<(Array2<f64>, Array1<f64>)> {
    if dm.nrows() != obs.len() {
        return Err(OrbitalError::DimensionMismatch(format!(
            "design matrix has {} rows but observation vector has {} elements",
            dm.nrows(),
            obs.len()
        )));
    }

    let valid: Vec<usize> = obs
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, _)| i)
        .collect();

    if valid.is_empty() {
        return Err(OrbitalError::NoValidData);
    }

    let filtered_dm = dm.select(ndarray::Axis(0), &valid);
    let filtered_obs = obs.select(ndarray::Axis(0), &valid);

    log::debug!("Filtered {} of {} rows with no data", obs.len() - valid.len(), obs.len());

    Ok((filtered_dm, filtered_obs))
}

/// Ordinary least squares with NaN observations removed
///
/// Uses the machine-precision cutoff `eps * max(m, n)`, so a full column
/// rank system is solved exactly.
pub fn solve_least_squares(dm: ArrayView2<f64>, obs: ArrayView1<f64>) -> OrbitalResult<Array1<f64>> {
    let rcond = f64::EPSILON * dm.nrows().max(dm.ncols()) as f64;
    solve_filtered(dm, obs, rcond)
}

/// Minimum-norm pseudo-inverse solve with NaN observations removed
pub fn solve_min_norm(dm: ArrayView2<f64>, obs: ArrayView1<f64>, rcond: f64) -> OrbitalResult<Array1<f64>> {
    if rcond.is_nan() || rcond < 0.0 {
        return Err(OrbitalError::InvalidParameter(format!("negative singular value cutoff {}", rcond)));
    }
    solve_filtered(dm, obs, rcond)
}

fn solve_filtered(dm: ArrayView2<f64>, obs: ArrayView1<f64>, rcond: f64) -> OrbitalResult<Array1<f64>> {
    let (a, b) = filter_nan_rows(dm, obs)?;
    svd_solve(&a, &b, rcond)
}

/// Pseudo-inverse solve of `a x = b` through a thin SVD
pub fn svd_solve(a: &Array2<f64>, b: &Array1<f64>, rcond: f64) -> OrbitalResult<Array1<f64>> {
    let (nrows, ncols) = a.dim();
    if nrows != b.len() {
        return Err(OrbitalError::DimensionMismatch(format!(
            "matrix has {} rows but right-hand side has {} elements",
            nrows,
            b.len()
        )));
    }
    if nrows == 0 || ncols == 0 {
        return Err(OrbitalError::NoValidData);
    }

    let matrix = DMatrix::from_fn(nrows, ncols, |r, c| a[[r, c]]);
    let rhs = DVector::from_iterator(nrows, b.iter().copied());

    let svd = SVD::try_new(matrix, true, true, f64::EPSILON, 0)
        .ok_or_else(|| OrbitalError::Solver("SVD did not converge".to_string()))?;

    let max_sv = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = rcond * max_sv;
    let rank = svd.singular_values.iter().filter(|&&sv| sv > cutoff).count();

    log::debug!(
        "SVD solve {}x{}: max singular value {:.3e}, cutoff {:.3e}, rank {}",
        nrows,
        ncols,
        max_sv,
        cutoff,
        rank
    );

    if rank == 0 {
        return Err(OrbitalError::Solver("design matrix has no non-zero singular values".to_string()));
    }

    let solution = svd.solve(&rhs, cutoff).map_err(|e| OrbitalError::Solver(e.to_string()))?;

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(OrbitalError::Solver("non-finite model coefficients".to_string()));
    }

    Ok(Array1::from_iter(solution.iter().copied()))
}
