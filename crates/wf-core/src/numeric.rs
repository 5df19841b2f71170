use crate::WfError;

/// Floating point type used throughout the system
pub type Real = f64;

/// Absolute + relative tolerance pair
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, WfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WfError::NonFinite { what, value: v })
    }
}

/// Nearest power of ten to `|v|`, e.g. `0.014 -> 0.01`, `714.3 -> 1000`.
///
/// Returns `None` for zero or non-finite input.
pub fn power_of_ten(v: Real) -> Option<Real> {
    if v == 0.0 || !v.is_finite() {
        return None;
    }
    let exponent = v.abs().log10().round() as i32;
    Some(10f64.powi(exponent))
}

/// Linear interpolation of `y` at `x` between `(x0, y0)` and `(x1, y1)`.
pub fn lerp(x0: Real, y0: Real, x1: Real, y1: Real, x: Real) -> Real {
    if x1 == x0 {
        return 0.5 * (y0 + y1);
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn lerp_stays_between_endpoints(
            x0 in -100.0_f64..100.0,
            dx in 0.1_f64..50.0,
            y0 in -1e3_f64..1e3,
            y1 in -1e3_f64..1e3,
            t in 0.0_f64..=1.0,
        ) {
            let x1 = x0 + dx;
            let y = lerp(x0, y0, x1, y1, x0 + t * dx);
            let tol = 1e-9 * (1.0 + y0.abs().max(y1.abs()));
            prop_assert!(y >= y0.min(y1) - tol && y <= y0.max(y1) + tol);
        }

        #[test]
        fn power_of_ten_is_within_half_a_decade(v in 1e-12_f64..1e12) {
            let p = power_of_ten(v).unwrap();
            let ratio = (v / p).log10().abs();
            prop_assert!(ratio <= 0.5 + 1e-12);
        }
    }
}
