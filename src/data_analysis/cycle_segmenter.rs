// src/data_analysis/cycle_segmenter.rs

use tracing::trace;

use crate::types::ExtremumPair;

/// One stick-slip cycle: a local minimum paired with the local maximum that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub min_idx: usize,
    pub max_idx: usize,
}

impl From<Cycle> for ExtremumPair {
    fn from(cycle: Cycle) -> Self {
        (cycle.min_idx, cycle.max_idx)
    }
}

/// Pairs each local minimum with the first local maximum (in index-list order)
/// whose position lies strictly between that minimum and the next minimum.
/// The last minimum takes the first maximum positioned beyond it.
///
/// The first qualifying maximum wins even if a later one in range has a larger
/// force. A minimum with no qualifying maximum contributes no cycle. Every
/// returned cycle satisfies `position[max_idx] > position[min_idx]`.
pub fn segment_cycles(
    position: &[f64],
    force: &[f64],
    max_indices: &[usize],
    min_indices: &[usize],
) -> Vec<Cycle> {
    pair_extrema(position, force, min_indices, max_indices)
        .into_iter()
        .map(|(min_idx, max_idx)| Cycle { min_idx, max_idx })
        .collect()
}

/// Pairs each local maximum with the first following local minimum positioned
/// before the next maximum (beyond the last maximum for the final one): the
/// release half of each stick-slip event. Every returned pair satisfies
/// `position[min_idx] > position[max_idx]`.
pub fn segment_drops(
    position: &[f64],
    force: &[f64],
    max_indices: &[usize],
    min_indices: &[usize],
) -> Vec<Cycle> {
    pair_extrema(position, force, max_indices, min_indices)
        .into_iter()
        .map(|(max_idx, min_idx)| Cycle { min_idx, max_idx })
        .collect()
}

/// Shared pairing rule: `(anchor, target)` index pairs where each target is the
/// first one positioned strictly between its anchor and the next anchor.
fn pair_extrema(
    position: &[f64],
    force: &[f64],
    anchors: &[usize],
    targets: &[usize],
) -> Vec<(usize, usize)> {
    let len = position.len().min(force.len());
    let anchors: Vec<usize> = anchors.iter().copied().filter(|&i| i < len).collect();
    let targets: Vec<usize> = targets.iter().copied().filter(|&i| i < len).collect();

    let mut pairs = Vec::with_capacity(anchors.len());
    for (k, &anchor) in anchors.iter().enumerate() {
        let lower = position[anchor];
        let upper = anchors.get(k + 1).map(|&next| position[next]);

        let matched = targets.iter().copied().find(|&t| {
            let p = position[t];
            match upper {
                Some(upper) => p > lower && p < upper,
                None => p > lower,
            }
        });

        match matched {
            Some(target) => pairs.push((anchor, target)),
            None => trace!(anchor, "extremum has no qualifying partner"),
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    // minima at positions [0.0, 0.5, 1.0], maxima at [0.2, 0.7]
    const POSITION: [f64; 5] = [0.0, 0.2, 0.5, 0.7, 1.0];
    const FORCE: [f64; 5] = [2.0, 10.0, 1.0, 12.0, 3.0];

    #[test]
    fn pairs_each_minimum_with_the_next_maximum() {
        let cycles = segment_cycles(&POSITION, &FORCE, &[1, 3], &[0, 2, 4]);
        assert_eq!(
            cycles,
            vec![
                Cycle { min_idx: 0, max_idx: 1 },
                Cycle { min_idx: 2, max_idx: 3 },
            ]
        );
    }

    #[test]
    fn first_qualifying_maximum_wins_over_a_larger_one() {
        let position = [0.0, 0.1, 0.2, 0.3, 0.4];
        let force = [0.0, 5.0, 4.0, 9.0, 1.0];
        // two maxima between the minima at 0.0 and 0.4
        let cycles = segment_cycles(&position, &force, &[1, 3], &[0, 4]);
        assert_eq!(cycles, vec![Cycle { min_idx: 0, max_idx: 1 }]);
    }

    #[test]
    fn last_minimum_takes_first_maximum_beyond_it() {
        let position = [0.0, 0.1, 0.3, 0.6];
        let cycles = segment_cycles(&position, &[1.0, 4.0, 0.5, 6.0], &[1, 3], &[2]);
        assert_eq!(cycles, vec![Cycle { min_idx: 2, max_idx: 3 }]);
    }

    #[test]
    fn returned_cycles_always_advance_in_position() {
        // position goes backwards once; pairing must never yield a non-advancing cycle
        let position = [0.0, 0.3, 0.2, 0.5, 0.4, 0.9];
        let force = [1.0, 6.0, 2.0, 7.0, 3.0, 8.0];
        let cycles = segment_cycles(&position, &force, &[1, 3, 5], &[0, 2, 4]);
        assert!(!cycles.is_empty());
        for c in &cycles {
            assert!(position[c.max_idx] > position[c.min_idx], "{c:?}");
        }
    }

    #[test]
    fn no_minima_or_no_maxima_yields_nothing() {
        assert!(segment_cycles(&POSITION, &FORCE, &[1, 3], &[]).is_empty());
        assert!(segment_cycles(&POSITION, &FORCE, &[], &[0, 2, 4]).is_empty());
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let cycles = segment_cycles(&POSITION, &FORCE, &[1, 3, 99], &[0, 2, 4, 42]);
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn drops_pair_each_maximum_with_the_following_minimum() {
        let drops = segment_drops(&POSITION, &FORCE, &[1, 3], &[0, 2, 4]);
        assert_eq!(
            drops,
            vec![
                Cycle { min_idx: 2, max_idx: 1 },
                Cycle { min_idx: 4, max_idx: 3 },
            ]
        );
        for d in &drops {
            assert!(POSITION[d.min_idx] > POSITION[d.max_idx]);
        }
        let pair: ExtremumPair = drops[0].into();
        assert_eq!(pair, (2, 1));
    }
}
