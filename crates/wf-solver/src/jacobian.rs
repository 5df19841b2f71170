//! Finite difference Jacobian computation.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Compute the Jacobian by one-sided finite differences.
///
/// Column j perturbs x[j] by a step relative to its magnitude. The step is
/// forward unless it would leave `[lower[j], upper[j]]`, in which case it is
/// taken backward, so `f` is never evaluated outside the variable's domain
/// when one side fits.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    lower: &[f64],
    upper: &[f64],
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let f_x = f(x)?;
    finite_difference_jacobian_at(x, &f_x, f, lower, upper, epsilon)
}

/// Same as [`finite_difference_jacobian`] when `f(x)` is already known.
pub fn finite_difference_jacobian_at<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    f: F,
    lower: &[f64],
    upper: &[f64],
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let m = f_x.len();

    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = step(x[j], lower[j], upper[j], epsilon);
        let mut x_perturbed = x.clone();
        x_perturbed[j] += dx;

        let f_perturbed = f(&x_perturbed)?;
        let df = (f_perturbed - f_x) / dx;

        jac.set_column(j, &df);
    }

    Ok(jac)
}

fn step(x: f64, lower: f64, upper: f64, epsilon: f64) -> f64 {
    let h = epsilon * x.abs().max(1.0);
    if x + h > upper && x - h >= lower { -h } else { h }
}
