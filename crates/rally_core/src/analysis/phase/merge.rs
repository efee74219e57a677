//! # Minimum-Length Merge
//!
//! Fixed-point pass over a segment arena. Each round picks the shortest
//! non-serve segment below `min_phase_length` (leftmost on ties) and folds it
//! into its longer non-serve neighbor (the following one on ties).
//!
//! Serve segments are never candidates and never targets, so a serve acts as
//! a partition: segments on either side of it cannot reach each other.
//! Every merge removes exactly one segment, bounding the loop at
//! `len - 1` rounds.

use super::segment::PhaseSegment;

/// Which side a short segment merges into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Previous,
    Following,
}

fn mergeable(seg: &PhaseSegment) -> bool {
    !seg.is_serve
}

/// Preferred neighbor of `idx`, if any non-serve neighbor exists.
fn pick_neighbor(segments: &[PhaseSegment], idx: usize) -> Option<Side> {
    let prev = idx
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .filter(|s| mergeable(s));
    let next = segments.get(idx + 1).filter(|s| mergeable(s));

    match (prev, next) {
        (Some(p), Some(n)) => {
            if p.shot_count > n.shot_count {
                Some(Side::Previous)
            } else {
                Some(Side::Following)
            }
        }
        (Some(_), None) => Some(Side::Previous),
        (None, Some(_)) => Some(Side::Following),
        (None, None) => None,
    }
}

/// Shortest short segment that has somewhere to go.
fn next_candidate(segments: &[PhaseSegment], min_len: usize) -> Option<(usize, Side)> {
    segments
        .iter()
        .enumerate()
        .filter(|(_, s)| mergeable(s) && s.shot_count < min_len)
        .filter_map(|(i, s)| pick_neighbor(segments, i).map(|side| (i, side, s.shot_count)))
        // min_by_key keeps the first minimum, i.e. the leftmost
        .min_by_key(|&(_, _, count)| count)
        .map(|(i, side, _)| (i, side))
}

/// Merge short segments in place until none can move.
pub fn merge_short_segments(segments: &mut Vec<PhaseSegment>, min_phase_length: usize) {
    let mut rounds = 0;
    while segments.len() > 1 {
        let Some((idx, side)) = next_candidate(segments, min_phase_length) else {
            break;
        };
        let (left, right) = match side {
            Side::Previous => (idx - 1, idx),
            Side::Following => (idx, idx + 1),
        };
        let absorbed = segments.remove(right);
        segments[left].absorb(absorbed);
        rounds += 1;
    }
    if rounds > 0 {
        log::trace!("merged {} short phases, {} remain", rounds, segments.len());
    }
}
