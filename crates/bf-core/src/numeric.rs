use crate::{BfError, BfResult};

/// Floating point type used throughout the solver
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> BfResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BfError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> BfResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(BfError::NonPositive { what, value: v })
    }
}

/// Maximum that propagates NaN.
///
/// `f64::max` drops NaN operands, which would hide a blown-up field from the
/// divergence check.
#[inline]
pub fn nan_max(a: Real, b: Real) -> Real {
    if a.is_nan() || b.is_nan() {
        Real::NAN
    } else {
        a.max(b)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn nan_max_matches_max_for_finite(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            prop_assert_eq!(nan_max(a, b), a.max(b));
        }
    }
}
