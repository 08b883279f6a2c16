// src/data_analysis/smoothing.rs

use std::collections::VecDeque;

use ndarray::Array1;

/// Applies a centred moving average to a 1D series.
/// The window shrinks at the edges so the output has the same length as the input.
pub fn moving_average_smooth(data: &Array1<f64>, window_size: usize) -> Array1<f64> {
    if window_size <= 1 || data.len() < 2 {
        return data.to_owned(); // No smoothing needed or possible.
    }

    let n = data.len();
    let half = window_size / 2;
    let mut smoothed = Array1::<f64>::zeros(n);
    let mut current_sum = 0.0;
    let mut history: VecDeque<f64> = VecDeque::with_capacity(window_size + 1);
    let mut next_in = 0;

    for i in 0..n {
        let window_end = (i + half).min(n - 1);
        while next_in <= window_end {
            history.push_back(data[next_in]);
            current_sum += data[next_in];
            next_in += 1;
        }
        let window_start = i.saturating_sub(half);
        while next_in - history.len() < window_start {
            if let Some(old_val) = history.pop_front() {
                current_sum -= old_val;
            }
        }
        smoothed[i] = current_sum / history.len() as f64;
    }
    smoothed
}

/// Finds local maxima and minima of a smoothed series.
///
/// A maximum is the leftmost point of a peak or plateau (`y > prev && y >= next`),
/// a minimum the leftmost point of a trough (`y < prev && y <= next`). The first
/// and last samples are never extrema. Both index lists are strictly increasing.
pub fn find_local_extrema(values: &Array1<f64>) -> (Vec<usize>, Vec<usize>) {
    let mut max_indices = Vec::new();
    let mut min_indices = Vec::new();
    if values.len() < 3 {
        return (max_indices, min_indices);
    }

    for j in 1..(values.len() - 1) {
        let (prev, y, next) = (values[j - 1], values[j], values[j + 1]);
        if y > prev && y >= next {
            max_indices.push(j);
        } else if y < prev && y <= next {
            min_indices.push(j);
        }
    }
    (max_indices, min_indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn window_of_one_is_identity() {
        let data = array![1.0, 5.0, 2.0];
        assert_eq!(moving_average_smooth(&data, 1), data);
    }

    #[test]
    fn centred_window_shrinks_at_edges() {
        let data = array![0.0, 3.0, 6.0, 9.0];
        let smoothed = moving_average_smooth(&data, 3);
        assert_abs_diff_eq!(smoothed[0], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed[2], 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(smoothed[3], 7.5, epsilon = 1e-12);
    }

    #[test]
    fn extrema_alternate_on_a_sawtooth() {
        let force = array![0.0, 2.0, 1.0, 3.0, 0.5, 4.0, 4.0, 1.0];
        let (maxima, minima) = find_local_extrema(&force);
        assert_eq!(maxima, vec![1, 3, 5]);
        assert_eq!(minima, vec![2, 4]);
    }

    #[test]
    fn short_series_have_no_extrema() {
        let (maxima, minima) = find_local_extrema(&array![1.0, 2.0]);
        assert!(maxima.is_empty() && minima.is_empty());
    }
}
