// POD basis: mean field, principal components, per-mode scale
//
// A field snapshot is approximated as the mean plus a weighted sum of a few
// leading spatial patterns. The patterns arrive ranked by explained
// variance, and that stored order is load-bearing: truncating to the first
// k rows must keep the k most energetic modes, so rows are never reordered
// here.
//
// The basis is built by the offline POD step and shipped as an NPZ archive
// with three named arrays: `mean` (length P), `pca_components`
// ([num_modes, P]) and `pca_std` (length num_modes).

use ndarray::{Array1, Array2, ArrayView1};
use ndarray_npy::NpzReader;
use std::fs::File;
use std::path::Path;

use crate::error::SurrogateError;

// ============================================================================
// BASIS MODEL
// ============================================================================

#[derive(Debug, Clone)]
pub struct PodBasis {
    // Mean field over the training snapshots, one value per spatial point
    mean: Array1<f64>,

    // Principal components, one row per mode, ranked by explained variance
    components: Array2<f64>,

    // Per-mode scaling (mode standard deviations from the POD step)
    scale: Array1<f64>,
}

impl PodBasis {
    // Build a basis from its three arrays, rejecting any shape disagreement.
    // This is the only way to construct a PodBasis: there is no partially
    // initialized state to overwrite later.
    pub fn new(
        mean: Array1<f64>,
        components: Array2<f64>,
        scale: Array1<f64>,
    ) -> Result<Self, SurrogateError> {
        if components.nrows() != scale.len() {
            return Err(SurrogateError::DimensionMismatch(format!(
                "basis has {} component rows but {} scale entries",
                components.nrows(),
                scale.len()
            )));
        }
        if components.ncols() != mean.len() {
            return Err(SurrogateError::DimensionMismatch(format!(
                "component rows have {} points but the mean field has {}",
                components.ncols(),
                mean.len()
            )));
        }
        if mean.is_empty() {
            return Err(SurrogateError::DimensionMismatch(
                "basis mean field is empty".to_string(),
            ));
        }
        Ok(Self {
            mean,
            components,
            scale,
        })
    }

    // Load the NPZ archive written by the offline POD step
    pub fn from_npz(path: impl AsRef<Path>) -> Result<Self, SurrogateError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SurrogateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut npz = NpzReader::new(file)
            .map_err(|e| SurrogateError::load(path, format!("not a readable NPZ archive: {e}")))?;

        // numpy savez stores entries with a .npy suffix; accept either form
        let names = npz
            .names()
            .map_err(|e| SurrogateError::load(path, format!("cannot list archive entries: {e}")))?;
        let resolve = |key: &str| -> Result<String, SurrogateError> {
            let with_ext = format!("{key}.npy");
            names
                .iter()
                .find(|n| n.as_str() == key || n.as_str() == with_ext)
                .cloned()
                .ok_or_else(|| {
                    SurrogateError::load(path, format!("archive has no '{key}' array"))
                })
        };

        let mean: Array1<f64> = npz
            .by_name(&resolve("mean")?)
            .map_err(|e| SurrogateError::load(path, format!("bad 'mean' array: {e}")))?;
        let components: Array2<f64> = npz
            .by_name(&resolve("pca_components")?)
            .map_err(|e| SurrogateError::load(path, format!("bad 'pca_components' array: {e}")))?;
        let scale: Array1<f64> = npz
            .by_name(&resolve("pca_std")?)
            .map_err(|e| SurrogateError::load(path, format!("bad 'pca_std' array: {e}")))?;

        Self::new(mean, components, scale)
    }

    // Number of modes stored in the basis
    #[inline]
    pub fn num_modes(&self) -> usize {
        self.components.nrows()
    }

    // Number of spatial points in the template field
    #[inline]
    pub fn num_points(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    // Linear basis expansion: mean + Σ coef[i] * scale[i] * component_row[i]
    //
    // The effective mode count is the minimum of the request, the supplied
    // coefficients, and the stored rows - an over-ask is a silent
    // downgrade, never an out-of-bounds read. Zero modes reproduces the
    // mean field exactly.
    pub fn expand(&self, coefficients: ArrayView1<'_, f64>, num_modes: usize) -> Array1<f64> {
        let effective = num_modes.min(coefficients.len()).min(self.num_modes());

        let mut field = self.mean.clone();
        for i in 0..effective {
            field.scaled_add(coefficients[i] * self.scale[i], &self.components.row(i));
        }
        field
    }
}
