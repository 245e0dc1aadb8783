//! Iterative pairwise overlap resolution.
//!
//! Each pass visits every pair `(i, j)` with `i < j` in index order. An
//! overlapping pair is pushed apart by half the penetration depth each, on both
//! axes at once, and both rectangles are clamped back onto the floor before the
//! next pair is looked at. Passes repeat until one finds nothing to fix or the
//! budget runs out.
//!
//! The exact order of operations is part of the contract: B moves first using
//! A's old position, then A moves relative to B's *new* position, then both are
//! clamped. Changing any of that changes the numbers that come out.
//!
//! Convergence is empirical. Clamping one pair can push a rectangle back into a
//! neighbour that was already handled earlier in the same pass; the next pass
//! picks that up again.

use tracing::{debug, trace, warn};

use crate::error::{OverlapFixError, Result};
use crate::types::{Floor, Workstation};

/// Default pass budget.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Parameters of one resolver run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolverConfig {
    pub floor: Floor,
    pub max_iterations: usize,
}

impl ResolverConfig {
    pub fn new(floor: Floor) -> Self {
        Self {
            floor,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(OverlapFixError::config("max_iterations must be at least 1"));
        }
        let Floor { width, height } = self.floor;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(OverlapFixError::config(format!(
                "floor must be finite and positive, got {width} x {height}"
            )));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new(Floor::default())
    }
}

/// Outcome of a successful run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ResolveReport {
    /// Passes executed, including the final clean one.
    pub passes: usize,
    /// Pairwise separations performed across all passes.
    pub corrections: usize,
}

/// Separate every overlapping pair in place.
///
/// On error the slice may already have been moved; callers that need
/// all-or-nothing semantics should resolve a copy (the pipelines in
/// [`crate::run`] do).
pub fn resolve(stations: &mut [Workstation], config: &ResolverConfig) -> Result<ResolveReport> {
    config.validate()?;
    validate_stations(stations, &config.floor)?;

    let mut report = ResolveReport::default();
    let mut last_pass_corrections = 0;

    for pass in 1..=config.max_iterations {
        let corrections = run_pass(stations, &config.floor);
        report.passes = pass;
        report.corrections += corrections;

        if corrections == 0 {
            debug!(
                passes = report.passes,
                corrections = report.corrections,
                stations = stations.len(),
                "converged"
            );
            return Ok(report);
        }

        debug!(pass, corrections, "pass finished with corrections");
        last_pass_corrections = corrections;
    }

    warn!(
        passes = config.max_iterations,
        last_pass_corrections, "overlap resolution did not converge"
    );
    Err(OverlapFixError::Convergence {
        iterations: config.max_iterations,
        last_pass_corrections,
    })
}

/// One sweep over all pairs. Returns the number of pairs that were moved.
fn run_pass(stations: &mut [Workstation], floor: &Floor) -> usize {
    let mut corrections = 0;
    for i in 0..stations.len() {
        for j in (i + 1)..stations.len() {
            let (head, tail) = stations.split_at_mut(j);
            let (Some(a), Some(b)) = (head.get_mut(i), tail.first_mut()) else {
                continue;
            };
            if separate_pair(a, b, floor) {
                corrections += 1;
            }
        }
    }
    corrections
}

/// Push `a` and `b` apart if they overlap, then clamp both onto the floor.
fn separate_pair(a: &mut Workstation, b: &mut Workstation, floor: &Floor) -> bool {
    if !a.overlaps(b) {
        return false;
    }

    let delta_x = (a.length + b.length) / 2.0 - (a.x - b.x).abs();
    let delta_y = (a.width + b.width) / 2.0 - (a.y - b.y).abs();
    let (half_x, half_y) = (delta_x / 2.0, delta_y / 2.0);

    if a.x <= b.x {
        b.x += half_x;
    } else {
        b.x -= half_x;
    }
    if a.y <= b.y {
        b.y += half_y;
    } else {
        b.y -= half_y;
    }

    // A is compared against B's updated position.
    if a.x >= b.x {
        a.x += half_x;
    } else {
        a.x -= half_x;
    }
    if a.y >= b.y {
        a.y += half_y;
    } else {
        a.y -= half_y;
    }

    a.clamp_to(floor);
    b.clamp_to(floor);

    trace!(
        a = %a.name,
        b = %b.name,
        delta_x,
        delta_y,
        "separated pair"
    );
    true
}

/// Reject rectangles that can never satisfy the floor clamp, and non-finite
/// or non-positive fields.
fn validate_stations(stations: &[Workstation], floor: &Floor) -> Result<()> {
    for (idx, ws) in stations.iter().enumerate() {
        let label = || format!("workstation {} ('{}')", idx + 1, ws.name);
        if !(ws.x.is_finite() && ws.y.is_finite()) {
            return Err(OverlapFixError::config(format!(
                "{}: center ({}, {}) is not finite",
                label(),
                ws.x,
                ws.y
            )));
        }
        if !(ws.length.is_finite() && ws.width.is_finite() && ws.length > 0.0 && ws.width > 0.0)
        {
            return Err(OverlapFixError::config(format!(
                "{}: size {} x {} must be finite and positive",
                label(),
                ws.length,
                ws.width
            )));
        }
        if ws.length > floor.width || ws.width > floor.height {
            return Err(OverlapFixError::config(format!(
                "{}: size {} x {} does not fit on a {} x {} floor",
                label(),
                ws.length,
                ws.width,
                floor.width,
                floor.height
            )));
        }
    }
    Ok(())
}

/// Every overlapping pair `(i, j)`, `i < j`, in index order.
pub fn find_overlaps(stations: &[Workstation]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in stations.iter().enumerate() {
        for (j, b) in stations.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Indices of rectangles that stick out of the floor.
pub fn out_of_bounds(stations: &[Workstation], floor: &Floor) -> Vec<usize> {
    stations
        .iter()
        .enumerate()
        .filter(|(_, ws)| !ws.fits(floor))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn square(name: &str, x: f64, y: f64, side: f64) -> Workstation {
        Workstation::new(name, x, y, side, side)
    }

    fn floor100() -> ResolverConfig {
        ResolverConfig::new(Floor::new(100.0, 100.0))
    }

    #[test]
    fn test_coincident_pair_moves_both_away() {
        let mut a = square("a", 50.0, 50.0, 10.0);
        let mut b = square("b", 50.0, 50.0, 10.0);
        assert!(separate_pair(&mut a, &mut b, &Floor::new(100.0, 100.0)));
        // Tie: B goes positive first, A then sees B ahead of it and goes negative.
        assert_eq!((b.x, b.y), (55.0, 55.0));
        assert_eq!((a.x, a.y), (45.0, 45.0));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_pair_uses_updated_b_position() {
        // A right of B on x, below on y.
        let mut a = Workstation::new("a", 56.0, 40.0, 10.0, 10.0);
        let mut b = Workstation::new("b", 50.0, 48.0, 10.0, 10.0);
        separate_pair(&mut a, &mut b, &Floor::new(100.0, 100.0));
        // delta_x = 10 - 6 = 4, delta_y = 10 - 8 = 2
        assert_eq!(b.x, 48.0);
        assert_eq!(b.y, 49.0);
        assert_eq!(a.x, 58.0);
        assert_eq!(a.y, 39.0);
    }

    #[test]
    fn test_pair_clamps_against_floor() {
        let floor = Floor::new(100.0, 100.0);
        let mut a = square("a", 5.0, 5.0, 10.0);
        let mut b = square("b", 6.0, 6.0, 10.0);
        separate_pair(&mut a, &mut b, &floor);
        assert!(a.fits(&floor));
        assert!(b.fits(&floor));
        assert_eq!((a.x, a.y), (5.0, 5.0));
    }

    #[test]
    fn test_non_overlapping_pair_untouched() {
        let mut a = square("a", 10.0, 10.0, 10.0);
        let mut b = square("b", 20.0, 10.0, 10.0);
        assert!(!separate_pair(&mut a, &mut b, &Floor::new(100.0, 100.0)));
        assert_eq!((a.x, b.x), (10.0, 20.0));
    }

    #[test]
    fn test_resolve_reports_passes() {
        let mut stations = vec![square("a", 50.0, 50.0, 10.0), square("b", 50.0, 50.0, 10.0)];
        let report = resolve(&mut stations, &floor100()).unwrap();
        assert_eq!(report.passes, 2);
        assert_eq!(report.corrections, 1);
        assert!(find_overlaps(&stations).is_empty());
    }

    #[test]
    fn test_empty_and_single_converge_immediately() {
        let mut none: Vec<Workstation> = Vec::new();
        assert_eq!(resolve(&mut none, &floor100()).unwrap().passes, 1);

        let mut one = vec![square("solo", 30.0, 30.0, 10.0)];
        let report = resolve(&mut one, &floor100()).unwrap();
        assert_eq!(report, ResolveReport { passes: 1, corrections: 0 });
        assert_eq!(one[0].x, 30.0);
    }

    #[test]
    fn test_out_of_bounds_input_without_overlap_is_left_alone() {
        // Clamping only happens as part of a pairwise correction.
        let mut stations = vec![square("edge", 2.0, 50.0, 10.0)];
        resolve(&mut stations, &floor100()).unwrap();
        assert_eq!(stations[0].x, 2.0);
        assert_eq!(out_of_bounds(&stations, &Floor::new(100.0, 100.0)), vec![0]);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut stations = vec![square("a", 50.0, 50.0, 10.0)];
        let err = resolve(&mut stations, &floor100().with_max_iterations(0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_budget_of_one_fails_when_first_pass_corrects() {
        let mut stations = vec![square("a", 50.0, 50.0, 10.0), square("b", 50.0, 50.0, 10.0)];
        let err = resolve(&mut stations, &floor100().with_max_iterations(1)).unwrap_err();
        match err {
            OverlapFixError::Convergence {
                iterations,
                last_pass_corrections,
            } => {
                assert_eq!(iterations, 1);
                assert_eq!(last_pass_corrections, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_floor_rejected() {
        let mut stations = vec![square("a", 5.0, 5.0, 1.0)];
        let cfg = ResolverConfig::new(Floor::new(f64::NAN, 10.0));
        assert!(resolve(&mut stations, &cfg).unwrap_err().is_configuration());
        let cfg = ResolverConfig::new(Floor::new(10.0, -1.0));
        assert!(resolve(&mut stations, &cfg).unwrap_err().is_configuration());
    }

    #[test]
    fn test_bad_station_fields_rejected_before_moving() {
        let mut stations = vec![
            square("ok", 50.0, 50.0, 10.0),
            square("ok2", 50.0, 50.0, 10.0),
            Workstation::new("flat", 10.0, 10.0, 0.0, 5.0),
        ];
        let err = resolve(&mut stations, &floor100()).unwrap_err();
        assert!(err.to_string().contains("workstation 3 ('flat')"));
        assert_eq!(stations[0].x, 50.0);

        let mut inf = vec![Workstation::new("inf", f64::INFINITY, 1.0, 1.0, 1.0)];
        assert!(resolve(&mut inf, &floor100()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_find_overlaps_lists_pairs_in_order() {
        let stations = vec![
            square("a", 10.0, 10.0, 10.0),
            square("b", 12.0, 12.0, 10.0),
            square("c", 80.0, 80.0, 10.0),
            square("d", 14.0, 14.0, 10.0),
        ];
        assert_eq!(find_overlaps(&stations), vec![(0, 1), (0, 3), (1, 3)]);
    }
}
