//! Variables, constraints and named expressions.

use crate::expr::Expr;

/// A model variable.
///
/// `value == None` means the variable was never initialized; reading it
/// through [`crate::Model::eval`] is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub fixed: bool,
    /// Unit label for reports; no conversion is performed.
    pub units: Option<String>,
    /// User-supplied nominal magnitude, preferred by the scaling step.
    pub scale_hint: Option<f64>,
    /// Factor computed by the scaling step (scaled = value * scale).
    pub scale: Option<f64>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            lower: None,
            upper: None,
            fixed: false,
            units: None,
            scale_hint: None,
            scale: None,
        }
    }

    pub fn value(mut self, v: f64) -> Self {
        self.value = Some(v);
        self
    }

    pub fn bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn scale_hint(mut self, hint: f64) -> Self {
        self.scale_hint = Some(hint);
        self
    }

    /// Clamp a candidate value into the variable's bounds.
    pub fn project(&self, v: f64) -> f64 {
        let mut out = v;
        if let Some(lo) = self.lower {
            out = out.max(lo);
        }
        if let Some(hi) = self.upper {
            out = out.min(hi);
        }
        out
    }

    pub fn within_bounds(&self, v: f64, tol: f64) -> bool {
        self.lower.is_none_or(|lo| v >= lo - tol) && self.upper.is_none_or(|hi| v <= hi + tol)
    }
}

/// Equality constraint `body == 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub body: Expr,
    pub active: bool,
    /// Factor computed by the scaling step (scaled residual = body * scale).
    pub scale: Option<f64>,
}

/// A named post-solve quantity (costing indicator, derived flow, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpr {
    pub name: String,
    pub expr: Expr,
    pub units: Option<String>,
}
