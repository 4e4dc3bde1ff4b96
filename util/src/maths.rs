//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
/// This result is not an element of the function's codomain, but it is the
/// closest floating point number in the real numbers and thus fulfills the
/// property `self == self.div_euclid(rhs) * rhs + self.rem_euclid(rhs)`
/// approximatively.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap a value into the half-open range `[0, period)`.
///
/// Unlike [`rem_euclid`] the upper bound is never returned, a round-off
/// result equal to `period` is folded back to zero.
pub fn wrap_positive<T>(value: T, period: T) -> T
where
    T: Float
{
    let r = rem_euclid(value, period);
    if r >= period.abs() { T::zero() } else { r }
}

/// Wrap a value into the half-open range `(-period/2, period/2]`.
pub fn wrap_signed<T>(value: T, period: T) -> T
where
    T: Float
{
    let half = period / (T::one() + T::one());
    let r = wrap_positive(value, period);

    if r > half {
        r - period
    }
    else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rem_euclid() {
        assert_eq!(rem_euclid(370f64, 360f64), 10f64);
        assert_eq!(rem_euclid(-10f64, 360f64), 350f64);
        assert_eq!(rem_euclid(0f64, 360f64), 0f64);
    }

    #[test]
    fn test_wrap_positive() {
        assert_eq!(wrap_positive(720f64, 360f64), 0f64);
        assert_eq!(wrap_positive(-1e-20f64, 360f64), 0f64);
        assert_eq!(wrap_positive(-90f64, 360f64), 270f64);
    }

    #[test]
    fn test_wrap_signed() {
        assert_eq!(wrap_signed(180f64, 360f64), 180f64);
        assert_eq!(wrap_signed(-180f64, 360f64), 180f64);
        assert_eq!(wrap_signed(190f64, 360f64), -170f64);
        assert_eq!(wrap_signed(-20f64, 360f64), -20f64);
        assert!(wrap_signed(f64::NAN, 360f64).is_nan());
    }
}
