//! Testing helpers.

use assert_float_eq::*;

pub fn assert_slice_f64_relative(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_relative_eq!(expected, actual, epsilon);
        }
    }
}

/// Asserts that two sets of curve samples agree on their inputs exactly and their prices to
/// within a relative `epsilon`.
pub fn assert_samples_relative(expected: &[(f64, f64)], actual: &[(f64, f64)], epsilon: f64) {
    let (expected_inputs, expected_prices): (Vec<_>, Vec<_>) = expected.iter().copied().unzip();
    let (actual_inputs, actual_prices): (Vec<_>, Vec<_>) = actual.iter().copied().unzip();
    assert_eq!(expected_inputs, actual_inputs);
    assert_slice_f64_relative(&expected_prices, &actual_prices, epsilon);
}
