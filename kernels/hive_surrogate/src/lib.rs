// HIVE Surrogate Reconstruction Core
//
// Reduced-order surrogate of HIVE thermal simulations: a pre-trained
// boosted-tree regressor predicts POD mode coefficients from
// (time, physical parameters), and a linear basis expands those
// coefficients back into a full temperature field over the experiment
// mesh. Both artifacts come from an offline training run and are loaded
// once, read-only, per session.
//
// Module map:
// - regressor:   boosted-tree ensemble, forward inference only
// - basis:       POD mean/components/scale, NPZ loading, linear expansion
// - reconstruct: the surrogate core combining both, plus the time-series
//                convenience pass over a pulse grid
// - params:      uncertain-parameter config -> labelled input bounds
// - field_io:    spatial template rewrite + renderer subprocess hand-off
// - setup:       explicit, idempotent artifact presence check
// - types/error: shared value types and the fatal error taxonomy

pub mod basis;
pub mod error;
pub mod field_io;
pub mod params;
pub mod reconstruct;
pub mod regressor;
pub mod setup;
pub mod types;

pub use basis::PodBasis;
pub use error::SurrogateError;
pub use params::{parse_parameters, ParameterSpec};
pub use reconstruct::{max_reduction, SurrogateReconstructor};
pub use regressor::GradientBoostedRegressor;
pub use setup::{ensure_artifacts, ArtifactPaths};
pub use types::{ReconstructionRequest, TimeGrid, TimeSeries};
