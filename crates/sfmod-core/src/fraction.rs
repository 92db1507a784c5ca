//! Exact-fraction rendering of measured values.
//!
//! Output numbers are strings holding a reduced fraction (`"8/5"`) or an
//! integer (`"4"`). Dumped values are single-precision floats printed in
//! decimal, so the closest small fraction within a relative tolerance is
//! taken rather than the exact binary value.

use num_rational::Ratio;

/// Relative error accepted when matching a value to a fraction.
const TOLERANCE: f64 = 1e-7;

/// Largest denominator considered.
const MAX_DENOMINATOR: i64 = 1_000_000;

/// Render `value` as an integer or reduced `numerator/denominator` string.
pub fn fraction_string(value: f64) -> String {
    to_ratio(value).to_string()
}

/// The closest small fraction to `value`; non-finite values map to zero.
pub fn to_ratio(value: f64) -> Ratio<i64> {
    if !value.is_finite() {
        return Ratio::from_integer(0);
    }
    let (numerator, denominator) = approximate(value.abs());
    let numerator = if value < 0.0 { -numerator } else { numerator };
    Ratio::new(numerator, denominator)
}

/// Continued-fraction convergents of a non-negative `x`, stopping at the
/// first one within tolerance.
fn approximate(x: f64) -> (i64, i64) {
    let tolerance = TOLERANCE * x.max(1.0);
    let (mut h_prev, mut h) = (1_i64, x.floor() as i64);
    let (mut k_prev, mut k) = (0_i64, 1_i64);
    let mut remainder = x - x.floor();

    while (x - h as f64 / k as f64).abs() > tolerance && remainder > f64::EPSILON {
        let reciprocal = 1.0 / remainder;
        let term = reciprocal.floor() as i64;
        let k_next = term * k + k_prev;
        if k_next > MAX_DENOMINATOR {
            break;
        }
        (h_prev, h) = (h, term * h + h_prev);
        (k_prev, k) = (k, k_next);
        remainder = reciprocal - reciprocal.floor();
    }
    (h, k)
}
