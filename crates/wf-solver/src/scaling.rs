//! Scale factors for variables and constraints.
//!
//! Variables get `1 / nominal`, where the nominal magnitude is the user hint
//! if present, otherwise the nearest power of ten of the current value.
//! Constraints get the inverse of the largest entry of their row in the
//! variable-scaled Jacobian. Only the `scale` fields are written, so calling
//! this twice on an unchanged model yields identical factors.

use tracing::debug;
use wf_core::power_of_ten;
use wf_model::Model;

use crate::error::SolverResult;
use crate::jacobian::finite_difference_jacobian;
use crate::system::SubSystem;

const MIN_CON_SCALE: f64 = 1e-8;
const MAX_CON_SCALE: f64 = 1e8;

/// Counts reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingReport {
    pub vars_scaled: usize,
    pub constraints_scaled: usize,
}

/// Nominal-magnitude scale factor for one variable.
fn var_scale(hint: Option<f64>, value: Option<f64>) -> f64 {
    if let Some(h) = hint
        && h.is_finite()
        && h != 0.0
    {
        return 1.0 / h.abs();
    }
    match value.and_then(power_of_ten) {
        Some(nominal) => 1.0 / nominal,
        None => 1.0,
    }
}

/// Compute and attach scale factors from the current variable values.
///
/// Fails only when an active constraint references a variable that was
/// never initialized.
pub fn calculate_scaling_factors(model: &mut Model, fd_epsilon: f64) -> SolverResult<ScalingReport> {
    let var_ids: Vec<_> = model.var_ids().collect();
    for &v in &var_ids {
        let var = model.var(v);
        let s = var_scale(var.scale_hint, var.value);
        model.var_mut(v).scale = Some(s);
    }

    let system = SubSystem::whole(model);
    let row_max = if system.vars.is_empty() || system.cons.is_empty() {
        vec![0.0; system.cons.len()]
    } else {
        let x = system.initial_point(model);
        let (lower, upper) = system.bounds(model);
        let jac = finite_difference_jacobian(
            &x,
            system.residual_fn(model),
            &lower,
            &upper,
            fd_epsilon,
        )?;
        let col_scales = system.var_scales(model, true);
        (0..jac.nrows())
            .map(|i| {
                (0..jac.ncols())
                    .map(|j| (jac[(i, j)] / col_scales[j]).abs())
                    .filter(|v| v.is_finite())
                    .fold(0.0, f64::max)
            })
            .collect()
    };

    for (&c, &m) in system.cons.iter().zip(&row_max) {
        let s = if m > 0.0 {
            (1.0 / m).clamp(MIN_CON_SCALE, MAX_CON_SCALE)
        } else {
            1.0
        };
        model.con_mut(c).scale = Some(s);
    }

    debug!(
        vars = var_ids.len(),
        constraints = system.cons.len(),
        "computed scaling factors"
    );

    Ok(ScalingReport {
        vars_scaled: var_ids.len(),
        constraints_scaled: system.cons.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_model::{Expr, Variable};

    fn model() -> Model {
        let mut m = Model::new();
        let q = m.add_var(Variable::new("q").value(0.014)).unwrap();
        let c = m.add_var(Variable::new("c").value(714.3)).unwrap();
        let w = m.add_var(Variable::new("w").value(1.0).scale_hint(1e-3)).unwrap();
        m.add_constraint("eq1", Expr::var(c) * Expr::var(q), 10.0).unwrap();
        m.add_constraint("eq2", Expr::var(w), Expr::var(q) * 0.5).unwrap();
        m
    }

    #[test]
    fn variable_scales_follow_magnitude_and_hint() {
        let mut m = model();
        calculate_scaling_factors(&mut m, 1e-7).unwrap();
        let scale = |n: &str| m.var(m.var_id(n).unwrap()).scale.unwrap();
        assert!((scale("q") - 100.0).abs() < 1e-9);
        assert!((scale("c") - 1e-3).abs() < 1e-15);
        assert!((scale("w") - 1e3).abs() < 1e-9);
    }

    #[test]
    fn rescaling_is_idempotent_and_preserves_values() {
        let mut m = model();
        let before = m.snapshot_values();
        calculate_scaling_factors(&mut m, 1e-7).unwrap();
        let first: Vec<_> = m
            .con_ids()
            .map(|c| m.con(c).scale)
            .chain(m.var_ids().map(|v| m.var(v).scale))
            .collect();
        calculate_scaling_factors(&mut m, 1e-7).unwrap();
        let second: Vec<_> = m
            .con_ids()
            .map(|c| m.con(c).scale)
            .chain(m.var_ids().map(|v| m.var(v).scale))
            .collect();
        assert_eq!(first, second);
        assert_eq!(before, m.snapshot_values());
    }
}
