// Surrogate reconstruction core
//
// Combines the two pre-trained artifacts: the boosted-tree regressor maps
// (time, parameters) to reduced POD coefficients, and the linear basis
// expands those coefficients back into a full spatial field. This is the
// whole forward model - everything upstream of it (training, mode
// selection) happened offline, and everything downstream (plots, mesh
// scenes) only consumes its output.

use ndarray::{Array1, ArrayView1};
use std::path::Path;

use crate::basis::PodBasis;
use crate::error::SurrogateError;
use crate::regressor::GradientBoostedRegressor;
use crate::types::{ReconstructionRequest, TimeGrid, TimeSeries};

// ============================================================================
// RECONSTRUCTOR
// ============================================================================

// Owns the two artifacts for the lifetime of the session. Loading happens
// once; after that `reconstruct` touches no mutable state and is safely
// reentrant.
#[derive(Debug, Clone)]
pub struct SurrogateReconstructor {
    regressor: GradientBoostedRegressor,
    basis: PodBasis,
}

impl SurrogateReconstructor {
    // Load both artifacts from disk. Either file missing, malformed, or
    // internally inconsistent aborts construction - there is no partially
    // loaded reconstructor.
    pub fn from_files(
        regressor_path: impl AsRef<Path>,
        basis_path: impl AsRef<Path>,
    ) -> Result<Self, SurrogateError> {
        let regressor = GradientBoostedRegressor::from_file(regressor_path)?;
        let basis = PodBasis::from_npz(basis_path)?;
        Ok(Self::new(regressor, basis))
    }

    // Assemble from already-loaded parts (tests, embedding in a service)
    pub fn new(regressor: GradientBoostedRegressor, basis: PodBasis) -> Self {
        Self { regressor, basis }
    }

    #[inline]
    pub fn basis(&self) -> &PodBasis {
        &self.basis
    }

    #[inline]
    pub fn regressor(&self) -> &GradientBoostedRegressor {
        &self.regressor
    }

    // Reconstruct the full field for one (time, parameters) point
    //
    // 1. feature row = [time, parameters...] in training order
    // 2. regressor forward pass -> reduced coefficients
    // 3. effective modes = min(requested, predicted, stored)
    // 4. linear expansion: mean + Σ coef[i] * scale[i] * component_row[i]
    pub fn reconstruct(
        &self,
        request: &ReconstructionRequest,
    ) -> Result<Array1<f64>, SurrogateError> {
        let coefficients = self.regressor.predict(&request.features())?;
        Ok(self.basis.expand(coefficients.view(), request.num_modes))
    }

    // Reconstruct and collapse to a scalar with a caller-supplied reduction
    // (e.g. the field maximum for a peak-temperature readout)
    pub fn reconstruct_reduced<R>(
        &self,
        request: &ReconstructionRequest,
        reduction: R,
    ) -> Result<f64, SurrogateError>
    where
        R: Fn(ArrayView1<'_, f64>) -> f64,
    {
        let field = self.reconstruct(request)?;
        Ok(reduction(field.view()))
    }

    // Evaluate the surrogate over a time grid with fixed parameters
    //
    // Every grid point's field is reduced to one scalar for the series; the
    // final grid point's full-resolution field is kept as the snapshot for
    // spatial rendering. One pass produces both outputs.
    pub fn time_series<R>(
        &self,
        grid: &TimeGrid,
        parameters: &[f64],
        num_modes: usize,
        reduction: R,
    ) -> Result<TimeSeries, SurrogateError>
    where
        R: Fn(ArrayView1<'_, f64>) -> f64,
    {
        self.time_series_with_progress(grid, parameters, num_modes, reduction, |_| {})
    }

    // Same as `time_series`, reporting completed grid points to `progress`
    // (drives the CLI progress bar; library callers pass a no-op)
    pub fn time_series_with_progress<R, P>(
        &self,
        grid: &TimeGrid,
        parameters: &[f64],
        num_modes: usize,
        reduction: R,
        mut progress: P,
    ) -> Result<TimeSeries, SurrogateError>
    where
        R: Fn(ArrayView1<'_, f64>) -> f64,
        P: FnMut(u64),
    {
        let points = grid.points();

        let mut times = Vec::with_capacity(points.len());
        let mut values = Vec::with_capacity(points.len());
        let mut snapshot = None;

        for (i, &t) in points.iter().enumerate() {
            let request = ReconstructionRequest::new(t, parameters.to_vec(), num_modes);
            let field = self.reconstruct(&request)?;

            times.push(t);
            values.push(reduction(field.view()));
            // Last iteration's full field is the one rendered spatially
            if i == points.len() - 1 {
                snapshot = Some(field);
            }
            progress(i as u64 + 1);
        }

        // A validated TimeGrid always yields at least its start point
        let snapshot = snapshot.ok_or_else(|| {
            SurrogateError::DimensionMismatch("time grid produced no points".to_string())
        })?;

        Ok(TimeSeries {
            times,
            values,
            snapshot,
        })
    }
}

// Field maximum, the standard reduction for the pulse plot
pub fn max_reduction(field: ArrayView1<'_, f64>) -> f64 {
    field.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regressor::Tree;
    use ndarray::{arr1, arr2};

    // Regressor that always predicts [2, 3] regardless of input
    fn constant_regressor() -> GradientBoostedRegressor {
        let leaf = |group, value| Tree {
            group,
            split_feature: vec![0],
            threshold: vec![0.0],
            left: vec![-1],
            right: vec![-1],
            weight: vec![value],
        };
        GradientBoostedRegressor::new(3, 2, vec![0.0, 0.0], vec![leaf(0, 2.0), leaf(1, 3.0)])
            .unwrap()
    }

    fn identity_reconstructor() -> SurrogateReconstructor {
        let basis = PodBasis::new(
            arr1(&[0.0, 0.0]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr1(&[1.0, 1.0]),
        )
        .unwrap();
        SurrogateReconstructor::new(constant_regressor(), basis)
    }

    #[test]
    fn test_identity_basis_oracle() {
        // mean=0, components=I, scale=1, prediction [2,3] -> field [2,3]
        let model = identity_reconstructor();
        let field = model
            .reconstruct(&ReconstructionRequest::new(30.0, vec![1.0, 2.0], 2))
            .unwrap();
        assert_eq!(field.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_over_asked_modes_clamp() {
        let model = identity_reconstructor();
        // Regressor emits 2 coefficients; asking for 10 modes must use 2
        let field = model
            .reconstruct(&ReconstructionRequest::new(30.0, vec![1.0, 2.0], 10))
            .unwrap();
        assert_eq!(field.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_zero_modes_is_mean() {
        let basis = PodBasis::new(
            arr1(&[300.0, 350.0]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr1(&[1.0, 1.0]),
        )
        .unwrap();
        let model = SurrogateReconstructor::new(constant_regressor(), basis);
        let field = model
            .reconstruct(&ReconstructionRequest::new(5.0, vec![0.0, 0.0], 0))
            .unwrap();
        assert_eq!(field.to_vec(), vec![300.0, 350.0]);
    }

    #[test]
    fn test_deterministic() {
        let model = identity_reconstructor();
        let request = ReconstructionRequest::new(45.0, vec![0.3, 0.7], 2);
        let a = model.reconstruct(&request).unwrap();
        let b = model.reconstruct(&request).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reduction_applied() {
        let model = identity_reconstructor();
        let peak = model
            .reconstruct_reduced(
                &ReconstructionRequest::new(30.0, vec![1.0, 2.0], 2),
                max_reduction,
            )
            .unwrap();
        assert_eq!(peak, 3.0);
    }

    #[test]
    fn test_wrong_parameter_count_surfaces() {
        let model = identity_reconstructor();
        // Regressor expects [time] + 2 parameters
        let result = model.reconstruct(&ReconstructionRequest::new(30.0, vec![1.0], 2));
        assert!(matches!(
            result,
            Err(SurrogateError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_time_series_default_grid() {
        let model = identity_reconstructor();
        let series = model
            .time_series(&TimeGrid::default(), &[1.0, 2.0], 2, max_reduction)
            .unwrap();

        assert_eq!(series.len(), 12);
        assert_eq!(series.times[0], 5.0);
        assert_eq!(series.times[11], 60.0);
        // Constant regressor: every series value is max([2,3]) = 3
        assert!(series.values.iter().all(|&v| v == 3.0));
        // Snapshot is the final full field, unreduced
        assert_eq!(series.snapshot.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_series_values_match_snapshot_reduction() {
        let model = identity_reconstructor();
        let series = model
            .time_series(&TimeGrid::default(), &[1.0, 2.0], 2, max_reduction)
            .unwrap();
        assert_eq!(
            *series.values.last().unwrap(),
            max_reduction(series.snapshot.view())
        );
    }

    #[test]
    fn test_progress_reports_every_point() {
        let model = identity_reconstructor();
        let mut seen = Vec::new();
        model
            .time_series_with_progress(
                &TimeGrid::default(),
                &[1.0, 2.0],
                2,
                max_reduction,
                |done| seen.push(done),
            )
            .unwrap();
        assert_eq!(seen, (1..=12).collect::<Vec<u64>>());
    }

    #[test]
    fn test_max_reduction() {
        assert_eq!(max_reduction(arr1(&[1.0, 5.0, 3.0]).view()), 5.0);
        assert_eq!(max_reduction(arr1(&[-3.0, -1.0]).view()), -1.0);
    }

    #[test]
    fn test_from_files_round_trip() {
        use ndarray_npy::NpzWriter;
        use std::fs::{self, File};

        let dir = std::env::temp_dir().join(format!("hive_artifacts_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let regressor_path = dir.join("xgb_model.json");
        fs::write(
            &regressor_path,
            r#"{
                "num_features": 3,
                "num_outputs": 2,
                "base_score": [2.0, 3.0],
                "trees": []
            }"#,
        )
        .unwrap();

        let basis_path = dir.join("pod_weights_truncated.npz");
        {
            let mut npz = NpzWriter::new(File::create(&basis_path).unwrap());
            npz.add_array("mean", &arr1(&[0.0, 0.0])).unwrap();
            npz.add_array("pca_components", &arr2(&[[1.0, 0.0], [0.0, 1.0]]))
                .unwrap();
            npz.add_array("pca_std", &arr1(&[1.0, 1.0])).unwrap();
            npz.finish().unwrap();
        }

        let model = SurrogateReconstructor::from_files(&regressor_path, &basis_path).unwrap();
        let field = model
            .reconstruct(&ReconstructionRequest::new(30.0, vec![1.0, 2.0], 2))
            .unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(field.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_missing_regressor_file_fails_load() {
        let result =
            SurrogateReconstructor::from_files("/nonexistent/xgb.json", "/nonexistent/pod.npz");
        assert!(result.is_err());
    }
}
