//! Selection of the variables and constraints handed to a solver.

use nalgebra::DVector;
use wf_core::{ConId, VarId};
use wf_model::{Model, ModelError};

use crate::error::{SolverError, SolverResult};

/// A square (or least-squares) slice of a model: unknowns and equations.
#[derive(Debug, Clone, PartialEq)]
pub struct SubSystem {
    pub vars: Vec<VarId>,
    pub cons: Vec<ConId>,
}

impl SubSystem {
    pub fn new(vars: Vec<VarId>, cons: Vec<ConId>) -> Self {
        Self { vars, cons }
    }

    /// All free variables in active constraints against all active constraints.
    pub fn whole(model: &Model) -> Self {
        Self {
            vars: model.free_vars_in_active(),
            cons: model.active_constraints(),
        }
    }

    /// The given constraints with every free variable they touch, except
    /// those listed in `held`.
    pub fn for_constraints(model: &Model, cons: Vec<ConId>, held: &[VarId]) -> Self {
        let mut vars = Vec::new();
        for &c in &cons {
            for v in model.con(c).body.vars() {
                if !model.is_fixed(v) && !held.contains(&v) && !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }
        vars.sort();
        Self { vars, cons }
    }

    pub fn is_empty(&self) -> bool {
        self.cons.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.vars.len() == self.cons.len()
    }

    /// Position of each model variable in the unknown vector.
    fn positions(&self, model: &Model) -> Vec<Option<usize>> {
        let mut pos = vec![None; model.num_vars()];
        for (i, v) in self.vars.iter().enumerate() {
            pos[v.slot()] = Some(i);
        }
        pos
    }

    /// Initial unknown vector. Unset variables start at zero projected into
    /// their bounds.
    pub fn initial_point(&self, model: &Model) -> DVector<f64> {
        DVector::from_iterator(
            self.vars.len(),
            self.vars.iter().map(|&v| {
                let var = model.var(v);
                var.value.unwrap_or_else(|| var.project(0.0))
            }),
        )
    }

    pub fn bounds(&self, model: &Model) -> (Vec<f64>, Vec<f64>) {
        let lower = self
            .vars
            .iter()
            .map(|&v| model.var(v).lower.unwrap_or(f64::NEG_INFINITY))
            .collect();
        let upper = self
            .vars
            .iter()
            .map(|&v| model.var(v).upper.unwrap_or(f64::INFINITY))
            .collect();
        (lower, upper)
    }

    /// Variable scale factors (1 when scaling is off or absent).
    pub fn var_scales(&self, model: &Model, use_scaling: bool) -> Vec<f64> {
        self.vars
            .iter()
            .map(|&v| match model.var(v).scale {
                Some(s) if use_scaling && s > 0.0 && s.is_finite() => s,
                _ => 1.0,
            })
            .collect()
    }

    pub fn con_scales(&self, model: &Model, use_scaling: bool) -> Vec<f64> {
        self.cons
            .iter()
            .map(|&c| match model.con(c).scale {
                Some(s) if use_scaling && s > 0.0 && s.is_finite() => s,
                _ => 1.0,
            })
            .collect()
    }

    /// Residual function over the unknown vector `x` (unscaled).
    pub fn residual_fn<'a>(
        &'a self,
        model: &'a Model,
    ) -> impl Fn(&DVector<f64>) -> SolverResult<DVector<f64>> + 'a {
        let positions = self.positions(model);
        move |x: &DVector<f64>| {
            let lookup = |v: VarId| match positions[v.slot()] {
                Some(i) => Some(x[i]),
                None => model.value(v),
            };
            let mut r = DVector::zeros(self.cons.len());
            for (i, &c) in self.cons.iter().enumerate() {
                r[i] = model.con(c).body.eval(&lookup).map_err(|v| {
                    SolverError::Model(ModelError::Uninitialized {
                        name: model.var(v).name.clone(),
                    })
                })?;
            }
            Ok(r)
        }
    }

    /// Write an unknown vector back into the model.
    pub fn write_back(&self, model: &mut Model, x: &DVector<f64>) {
        for (i, &v) in self.vars.iter().enumerate() {
            model.set_value(v, x[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_model::{Expr, Variable};

    #[test]
    fn residuals_use_unknown_vector_and_fixed_values() {
        let mut m = Model::new();
        let a = m.add_var(Variable::new("a").value(2.0).fixed()).unwrap();
        let b = m.add_var(Variable::new("b")).unwrap();
        m.add_constraint("eq", Expr::var(b), Expr::var(a) * 3.0).unwrap();

        let sys = SubSystem::whole(&m);
        assert_eq!(sys.vars, vec![b]);
        assert!(sys.is_square());

        let f = sys.residual_fn(&m);
        let r = f(&DVector::from_element(1, 5.0)).unwrap();
        assert_eq!(r[0], -1.0);
    }

    #[test]
    fn held_variables_are_excluded() {
        let mut m = Model::new();
        let a = m.add_var(Variable::new("a").value(1.0)).unwrap();
        let b = m.add_var(Variable::new("b")).unwrap();
        let c = m
            .add_constraint("eq", Expr::var(b), Expr::var(a) + 1.0)
            .unwrap();
        let sys = SubSystem::for_constraints(&m, vec![c], &[a]);
        assert_eq!(sys.vars, vec![b]);
    }

    #[test]
    fn unset_start_is_projected_zero() {
        let mut m = Model::new();
        let v = m
            .add_var(Variable::new("v").bounds(Some(1.0), Some(5.0)))
            .unwrap();
        let sys = SubSystem::new(vec![v], vec![]);
        assert_eq!(sys.initial_point(&m)[0], 1.0);
    }
}
