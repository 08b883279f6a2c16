// src/data_analysis/derivative.rs

use ndarray::Array1;

/// Calculates the discrete derivative of `values` with respect to `time`.
/// Used to derive probe velocity from the smoothed position trace.
/// Returns an empty array when the inputs are too short or mismatched.
pub fn calculate_derivative(values: &Array1<f64>, time: &Array1<f64>) -> Array1<f64> {
    let n = values.len();
    if n < 2 || time.len() != n {
        return Array1::zeros(0);
    }

    let slope = |i0: usize, i1: usize| -> f64 {
        let dt = time[i1] - time[i0];
        if dt.abs() > 1e-12 {
            (values[i1] - values[i0]) / dt
        } else {
            0.0
        }
    };

    let mut derivative = Array1::<f64>::zeros(n);

    // Use forward difference for first point
    derivative[0] = slope(0, 1);

    // Use central difference for middle points
    for i in 1..n - 1 {
        derivative[i] = slope(i - 1, i + 1);
    }

    // Use backward difference for last point
    derivative[n - 1] = slope(n - 2, n - 1);

    derivative
}
