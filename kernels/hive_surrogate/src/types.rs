// Type definitions for surrogate reconstruction
//
// These are the small value types shared by the reconstruction core and the
// CLI: the time grid the surrogate is evaluated over, a single reconstruction
// request, and the paired time-series output.

use ndarray::Array1;
use serde::Serialize;

use crate::error::SurrogateError;

// ============================================================================
// TIME GRID
// ============================================================================

// Evenly spaced, inclusive time grid for the surrogate pulse evaluation
//
// The HIVE pulse snapshots were written every 5 s from t=5 to t=60, so the
// default grid reproduces that range (12 points). The range is an explicit
// input rather than a literal inside the evaluation loop, so callers with
// differently sampled snapshot sets can pass their own grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    // First evaluated time [s]
    pub start: f64,

    // Last evaluated time [s] (inclusive when reachable by whole steps)
    pub end: f64,

    // Spacing between evaluated times [s], must be positive
    pub step: f64,
}

impl TimeGrid {
    // Create a validated time grid
    //
    // A grid always contains at least one point (start itself), so the
    // time-series operation is never asked to produce a snapshot from an
    // empty loop.
    pub fn new(start: f64, end: f64, step: f64) -> Result<Self, SurrogateError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(SurrogateError::DimensionMismatch(format!(
                "time grid step must be positive, got {step}"
            )));
        }
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(SurrogateError::DimensionMismatch(format!(
                "time grid range [{start}, {end}] is not a valid interval"
            )));
        }
        Ok(Self { start, end, step })
    }

    // Materialize the grid points: start, start+step, ... up to end inclusive
    pub fn points(&self) -> Vec<f64> {
        // Integer stepping avoids accumulating floating-point drift over
        // the grid (0.1 * 600 style errors)
        let n = ((self.end - self.start) / self.step).floor() as usize;
        (0..=n).map(|i| self.start + i as f64 * self.step).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        ((self.end - self.start) / self.step).floor() as usize + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false // a valid grid always contains its start point
    }
}

impl Default for TimeGrid {
    // The pulse range used for training the published HIVE surrogate
    fn default() -> Self {
        Self {
            start: 5.0,
            end: 60.0,
            step: 5.0,
        }
    }
}

// ============================================================================
// RECONSTRUCTION REQUEST
// ============================================================================

// One forward pass through the surrogate
//
// `parameters` must use the same ordering the regressor saw during training;
// that ordering is a caller contract and is not validated here.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionRequest {
    // Physical time to reconstruct [s]
    pub time: f64,

    // Uncertain physical parameters, training order
    pub parameters: Vec<f64>,

    // Requested number of POD modes. Clamped to what the regressor and
    // basis actually provide - never an error, always a silent downgrade.
    pub num_modes: usize,
}

impl ReconstructionRequest {
    pub fn new(time: f64, parameters: Vec<f64>, num_modes: usize) -> Self {
        Self {
            time,
            parameters,
            num_modes,
        }
    }

    // Feature vector for the regressor: time first, then parameters,
    // preserving training order
    pub fn features(&self) -> Vec<f64> {
        let mut feats = Vec::with_capacity(1 + self.parameters.len());
        feats.push(self.time);
        feats.extend_from_slice(&self.parameters);
        feats
    }
}

// ============================================================================
// TIME SERIES OUTPUT
// ============================================================================

// Paired (time, reduced value) sequence plus the final full-field snapshot
//
// The scalar series drives the pulse plot; the snapshot (the last grid
// point's full-resolution field) drives the spatial view. Both come out of
// one pass over the grid.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    // Evaluated times [s]
    pub times: Vec<f64>,

    // Reduction of the reconstructed field at each time (e.g. max temperature)
    pub values: Vec<f64>,

    // Full unreduced field at the final time point
    #[serde(skip)]
    pub snapshot: Array1<f64>,
}

impl TimeSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    // Peak of the reduced series (useful for run summaries)
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.times
            .iter()
            .zip(&self.values)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(t, v)| (*t, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_matches_pulse() {
        let grid = TimeGrid::default();
        let points = grid.points();
        assert_eq!(points.len(), 12);
        assert_eq!(points[0], 5.0);
        assert_eq!(points[11], 60.0);
        assert_eq!(points[1] - points[0], 5.0);
    }

    #[test]
    fn test_grid_rejects_bad_step() {
        assert!(TimeGrid::new(5.0, 60.0, 0.0).is_err());
        assert!(TimeGrid::new(5.0, 60.0, -5.0).is_err());
        assert!(TimeGrid::new(5.0, 60.0, f64::NAN).is_err());
    }

    #[test]
    fn test_grid_rejects_inverted_range() {
        assert!(TimeGrid::new(60.0, 5.0, 5.0).is_err());
    }

    #[test]
    fn test_degenerate_grid_is_single_point() {
        let grid = TimeGrid::new(5.0, 5.0, 5.0).unwrap();
        assert_eq!(grid.points(), vec![5.0]);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_non_divisible_range_stops_before_end() {
        let grid = TimeGrid::new(0.0, 11.0, 5.0).unwrap();
        assert_eq!(grid.points(), vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_request_features_ordering() {
        let req = ReconstructionRequest::new(30.0, vec![1.5, 2.5], 4);
        assert_eq!(req.features(), vec![30.0, 1.5, 2.5]);
    }

    #[test]
    fn test_series_peak() {
        let series = TimeSeries {
            times: vec![5.0, 10.0, 15.0],
            values: vec![300.0, 450.0, 420.0],
            snapshot: Array1::zeros(3),
        };
        assert_eq!(series.peak(), Some((10.0, 450.0)));
    }
}
