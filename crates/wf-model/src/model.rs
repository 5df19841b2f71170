//! The case model: arenas of variables, constraints and expressions with a
//! name index.

use std::collections::HashMap;

use wf_core::{ConId, ExprId, VarId};

use crate::error::{ModelError, ModelResult};
use crate::expr::Expr;
use crate::variable::{Constraint, NamedExpr, Variable};

/// A resolved reference to a named model component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Var(VarId),
    Con(ConId),
    Expr(ExprId),
}

/// Equation-oriented model owned by exactly one case.
#[derive(Debug, Clone, Default)]
pub struct Model {
    vars: Vec<Variable>,
    cons: Vec<Constraint>,
    exprs: Vec<NamedExpr>,
    names: HashMap<String, Handle>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&mut self, name: &str, handle: Handle) -> ModelResult<()> {
        if self.names.contains_key(name) {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
            });
        }
        self.names.insert(name.to_string(), handle);
        Ok(())
    }

    pub fn add_var(&mut self, var: Variable) -> ModelResult<VarId> {
        let id = VarId::from_index(self.vars.len() as u32);
        self.claim_name(&var.name, Handle::Var(id))?;
        self.vars.push(var);
        Ok(id)
    }

    /// Add the equality `lhs == rhs`.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        lhs: impl Into<Expr>,
        rhs: impl Into<Expr>,
    ) -> ModelResult<ConId> {
        let name = name.into();
        let id = ConId::from_index(self.cons.len() as u32);
        self.claim_name(&name, Handle::Con(id))?;
        self.cons.push(Constraint {
            name,
            body: lhs.into() - rhs.into(),
            active: true,
            scale: None,
        });
        Ok(id)
    }

    pub fn add_expression(
        &mut self,
        name: impl Into<String>,
        expr: impl Into<Expr>,
        units: Option<&str>,
    ) -> ModelResult<ExprId> {
        let name = name.into();
        let id = ExprId::from_index(self.exprs.len() as u32);
        self.claim_name(&name, Handle::Expr(id))?;
        self.exprs.push(NamedExpr {
            name,
            expr: expr.into(),
            units: units.map(str::to_string),
        });
        Ok(id)
    }

    // --- lookup ---------------------------------------------------------

    pub fn lookup(&self, name: &str) -> Option<Handle> {
        self.names.get(name).copied()
    }

    /// Resolve a name that must refer to a variable.
    pub fn var_id(&self, name: &str) -> ModelResult<VarId> {
        match self.lookup(name) {
            Some(Handle::Var(id)) => Ok(id),
            Some(_) => Err(ModelError::NotAVariable {
                name: name.to_string(),
            }),
            None => Err(ModelError::UnknownName {
                name: name.to_string(),
            }),
        }
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.slot()]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.vars[id.slot()]
    }

    pub fn con(&self, id: ConId) -> &Constraint {
        &self.cons[id.slot()]
    }

    pub fn con_mut(&mut self, id: ConId) -> &mut Constraint {
        &mut self.cons[id.slot()]
    }

    pub fn expression(&self, id: ExprId) -> &NamedExpr {
        &self.exprs[id.slot()]
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.cons.len()
    }

    pub fn var_ids(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.vars.len() as u32).map(VarId::from_index)
    }

    pub fn con_ids(&self) -> impl Iterator<Item = ConId> + '_ {
        (0..self.cons.len() as u32).map(ConId::from_index)
    }

    /// Variables whose name starts with `prefix`, in creation order.
    pub fn vars_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = VarId> + 'a {
        self.var_ids()
            .filter(move |&id| self.vars[id.slot()].name.starts_with(prefix))
    }

    /// Constraints whose name starts with `prefix`, in creation order.
    pub fn cons_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = ConId> + 'a {
        self.con_ids()
            .filter(move |&id| self.cons[id.slot()].name.starts_with(prefix))
    }

    // --- state mutation ------------------------------------------------

    pub fn value(&self, id: VarId) -> Option<f64> {
        self.vars[id.slot()].value
    }

    pub fn set_value(&mut self, id: VarId, v: f64) {
        self.vars[id.slot()].value = Some(v);
    }

    /// Fix a variable at `v`.
    pub fn fix(&mut self, id: VarId, v: f64) {
        let var = &mut self.vars[id.slot()];
        var.value = Some(v);
        var.fixed = true;
    }

    /// Fix a variable at its current value.
    pub fn fix_current(&mut self, id: VarId) -> ModelResult<()> {
        let var = &mut self.vars[id.slot()];
        if var.value.is_none() {
            return Err(ModelError::FixedWithoutValue {
                name: var.name.clone(),
            });
        }
        var.fixed = true;
        Ok(())
    }

    pub fn unfix(&mut self, id: VarId) {
        self.vars[id.slot()].fixed = false;
    }

    pub fn is_fixed(&self, id: VarId) -> bool {
        self.vars[id.slot()].fixed
    }

    pub fn set_bounds(&mut self, id: VarId, lower: Option<f64>, upper: Option<f64>) {
        let var = &mut self.vars[id.slot()];
        var.lower = lower;
        var.upper = upper;
    }

    pub fn set_active(&mut self, id: ConId, active: bool) {
        self.cons[id.slot()].active = active;
    }

    /// Copy of every variable value, for later [`Model::restore_values`].
    pub fn snapshot_values(&self) -> Vec<Option<f64>> {
        self.vars.iter().map(|v| v.value).collect()
    }

    pub fn restore_values(&mut self, values: &[Option<f64>]) {
        for (var, v) in self.vars.iter_mut().zip(values) {
            var.value = *v;
        }
    }

    // --- evaluation ----------------------------------------------------

    /// Evaluate an expression against current values.
    pub fn eval(&self, expr: &Expr) -> ModelResult<f64> {
        expr.eval(&|v| self.vars[v.slot()].value)
            .map_err(|v| ModelError::Uninitialized {
                name: self.vars[v.slot()].name.clone(),
            })
    }

    /// Evaluate a variable value or named expression.
    pub fn eval_handle(&self, handle: Handle) -> ModelResult<f64> {
        match handle {
            Handle::Var(id) => self.vars[id.slot()]
                .value
                .ok_or_else(|| ModelError::Uninitialized {
                    name: self.vars[id.slot()].name.clone(),
                }),
            Handle::Expr(id) => self.eval(&self.exprs[id.slot()].expr),
            Handle::Con(id) => self.residual(id),
        }
    }

    /// Evaluate a named expression or variable by name.
    pub fn eval_named(&self, name: &str) -> ModelResult<f64> {
        let handle = self.lookup(name).ok_or_else(|| ModelError::UnknownName {
            name: name.to_string(),
        })?;
        self.eval_handle(handle)
    }

    pub fn residual(&self, id: ConId) -> ModelResult<f64> {
        self.eval(&self.cons[id.slot()].body)
    }

    /// Largest absolute residual over active constraints.
    pub fn max_residual(&self) -> ModelResult<f64> {
        let mut worst: f64 = 0.0;
        for c in self.con_ids() {
            if self.cons[c.slot()].active {
                worst = worst.max(self.residual(c)?.abs());
            }
        }
        Ok(worst)
    }

    // --- structure -----------------------------------------------------

    pub fn active_constraints(&self) -> Vec<ConId> {
        self.con_ids()
            .filter(|c| self.cons[c.slot()].active)
            .collect()
    }

    /// Free variables that appear in at least one active constraint.
    pub fn free_vars_in_active(&self) -> Vec<VarId> {
        let mut seen = vec![false; self.vars.len()];
        let mut out = Vec::new();
        for c in self.cons.iter().filter(|c| c.active) {
            for v in c.body.vars() {
                if !seen[v.slot()] && !self.vars[v.slot()].fixed {
                    seen[v.slot()] = true;
                    out.push(v);
                }
            }
        }
        out.sort();
        out
    }

    /// Free variables in active constraints minus active constraints.
    pub fn degrees_of_freedom(&self) -> i64 {
        self.free_vars_in_active().len() as i64 - self.active_constraints().len() as i64
    }
}
