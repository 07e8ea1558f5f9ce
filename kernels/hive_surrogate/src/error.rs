// Error taxonomy for surrogate loading and reconstruction
//
// Every failure here is fatal to the reconstruction request: artifacts are
// produced by an offline training run, so a missing or inconsistent file
// cannot be repaired at inference time. There is no retry tier and no
// partial-result tier.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurrogateError {
    // Artifact missing, unreadable, or structurally corrupt
    #[error("failed to load artifact {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    // Config declares a prior we cannot turn into slider bounds.
    // Only uniform priors have a well-defined [loc, loc + scale] interval.
    #[error(
        "unsupported distribution '{distribution}' for parameter '{parameter}' \
         (only 'uniform' priors are implemented)"
    )]
    UnsupportedDistribution {
        parameter: String,
        distribution: String,
    },

    // Arrays that must agree in shape do not
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // External renderer subprocess failed
    #[error("renderer command '{command}' exited with {status}")]
    Renderer { command: String, status: String },
}

impl SurrogateError {
    // Shorthand for Load errors, which get built from several source
    // error types (zip/npy readers, shape checks) that all collapse to
    // "this artifact is unusable"
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
