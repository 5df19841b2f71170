//! Algebraic expression trees over model variables.

use std::ops::{Add, Div, Mul, Neg, Sub};

use wf_core::VarId;

/// Closed-form algebraic expression.
///
/// Built with the usual arithmetic operators:
///
/// ```
/// use wf_core::VarId;
/// use wf_model::Expr;
///
/// let q = Expr::var(VarId::from_index(0));
/// let e = 3600.0 * Expr::constant(0.23) * q;
/// let value = e.eval(&|_| Some(0.014)).unwrap();
/// assert!((value - 11.592).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(VarId),
    Sum(Vec<Expr>),
    Product(Box<Expr>, Box<Expr>),
    Quotient(Box<Expr>, Box<Expr>),
    Powf(Box<Expr>, f64),
    Neg(Box<Expr>),
}

impl Expr {
    pub fn constant(v: f64) -> Self {
        Expr::Const(v)
    }

    pub fn var(id: VarId) -> Self {
        Expr::Var(id)
    }

    /// Sum of any number of terms; an empty sum is zero.
    pub fn sum<I, T>(terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        let terms: Vec<Expr> = terms.into_iter().map(Into::into).collect();
        match terms.len() {
            0 => Expr::Const(0.0),
            1 => terms.into_iter().next().unwrap_or(Expr::Const(0.0)),
            _ => Expr::Sum(terms),
        }
    }

    pub fn powf(self, exponent: f64) -> Self {
        Expr::Powf(Box::new(self), exponent)
    }

    /// Evaluate with a variable lookup. On a missing value, returns the
    /// offending variable.
    pub fn eval(&self, lookup: &impl Fn(VarId) -> Option<f64>) -> Result<f64, VarId> {
        Ok(match self {
            Expr::Const(c) => *c,
            Expr::Var(v) => lookup(*v).ok_or(*v)?,
            Expr::Sum(terms) => {
                let mut total = 0.0;
                for t in terms {
                    total += t.eval(lookup)?;
                }
                total
            }
            Expr::Product(a, b) => a.eval(lookup)? * b.eval(lookup)?,
            Expr::Quotient(a, b) => a.eval(lookup)? / b.eval(lookup)?,
            Expr::Powf(base, p) => base.eval(lookup)?.powf(*p),
            Expr::Neg(a) => -a.eval(lookup)?,
        })
    }

    /// Append every variable referenced by this expression (duplicates kept).
    pub fn collect_vars(&self, out: &mut Vec<VarId>) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(v) => out.push(*v),
            Expr::Sum(terms) => terms.iter().for_each(|t| t.collect_vars(out)),
            Expr::Product(a, b) | Expr::Quotient(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
            Expr::Powf(a, _) | Expr::Neg(a) => a.collect_vars(out),
        }
    }

    /// Distinct variables in first-appearance order.
    pub fn vars(&self) -> Vec<VarId> {
        let mut all = Vec::new();
        self.collect_vars(&mut all);
        let mut seen = Vec::with_capacity(all.len());
        for v in all {
            if !seen.contains(&v) {
                seen.push(v);
            }
        }
        seen
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Const(v)
    }
}

impl From<VarId> for Expr {
    fn from(v: VarId) -> Self {
        Expr::Var(v)
    }
}

impl From<&Expr> for Expr {
    fn from(e: &Expr) -> Self {
        e.clone()
    }
}

impl<R: Into<Expr>> Add<R> for Expr {
    type Output = Expr;

    fn add(self, rhs: R) -> Expr {
        match (self, rhs.into()) {
            (Expr::Sum(mut a), Expr::Sum(b)) => {
                a.extend(b);
                Expr::Sum(a)
            }
            (Expr::Sum(mut a), b) => {
                a.push(b);
                Expr::Sum(a)
            }
            (a, b) => Expr::Sum(vec![a, b]),
        }
    }
}

impl<R: Into<Expr>> Sub<R> for Expr {
    type Output = Expr;

    fn sub(self, rhs: R) -> Expr {
        self + Expr::Neg(Box::new(rhs.into()))
    }
}

impl<R: Into<Expr>> Mul<R> for Expr {
    type Output = Expr;

    fn mul(self, rhs: R) -> Expr {
        Expr::Product(Box::new(self), Box::new(rhs.into()))
    }
}

impl<R: Into<Expr>> Div<R> for Expr {
    type Output = Expr;

    fn div(self, rhs: R) -> Expr {
        Expr::Quotient(Box::new(self), Box::new(rhs.into()))
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

impl Add<Expr> for f64 {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::Const(self) + rhs
    }
}

impl Sub<Expr> for f64 {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::Const(self) - rhs
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Const(self) * rhs
    }
}

impl Div<Expr> for f64 {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::Const(self) / rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: u32) -> Expr {
        Expr::var(VarId::from_index(i))
    }

    #[test]
    fn arithmetic_evaluates() {
        let e = (v(0) + v(1)) * 2.0 - v(2) / 4.0;
        let values = [1.0, 2.0, 8.0];
        let got = e.eval(&|id: VarId| values.get(id.slot()).copied()).unwrap();
        assert!((got - 4.0).abs() < 1e-12);
    }

    #[test]
    fn missing_value_names_variable() {
        let e = v(0) + v(3);
        let err = e.eval(&|id: VarId| (id.index() == 0).then_some(1.0)).unwrap_err();
        assert_eq!(err, VarId::from_index(3));
    }

    #[test]
    fn vars_are_distinct_in_order() {
        let e = v(2) * v(0) + v(2) - 1.0 / v(1);
        assert_eq!(
            e.vars(),
            vec![VarId::from_index(2), VarId::from_index(0), VarId::from_index(1)]
        );
    }

    #[test]
    fn sums_flatten() {
        let e = v(0) + v(1) + v(2);
        match e {
            Expr::Sum(terms) => assert_eq!(terms.len(), 3),
            other => panic!("expected flat sum, got {other:?}"),
        }
        assert_eq!(Expr::sum(Vec::<Expr>::new()), Expr::Const(0.0));
    }

    #[test]
    fn power_law() {
        let e = 2.0 * v(0).powf(0.5);
        let got = e.eval(&|_| Some(16.0)).unwrap();
        assert!((got - 8.0).abs() < 1e-12);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn product_distributes_over_sum(
            a in -1e3_f64..1e3,
            b in -1e3_f64..1e3,
            c in -1e3_f64..1e3,
        ) {
            let x = || Expr::var(VarId::from_index(0));
            let y = || Expr::var(VarId::from_index(1));
            let z = || Expr::var(VarId::from_index(2));
            let values = [a, b, c];
            let lookup = |id: VarId| values.get(id.slot()).copied();

            let lhs = ((x() + y()) * z()).eval(&lookup).unwrap();
            let rhs = (x() * z() + y() * z()).eval(&lookup).unwrap();
            prop_assert!((lhs - rhs).abs() <= 1e-9 * (1.0 + lhs.abs()));
        }
    }
}
