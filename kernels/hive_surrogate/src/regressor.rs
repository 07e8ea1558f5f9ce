// Gradient-boosted tree ensemble: forward inference only
//
// The regressor artifact is an offline JSON dump of the trained booster.
// Each tree is stored in flattened-array form (one entry per node, children
// referenced by index, -1 marking a leaf) and tagged with the output
// coefficient it contributes to. The contract here is strictly
// vector-in/vector-out: build a feature row, sum the leaf weights each tree
// routes it to, add the per-output base score.
//
// Training, pruning, and objective handling all live in the offline
// pipeline; nothing in this module mutates the model.

use ndarray::Array1;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::SurrogateError;

// Child-index sentinel marking a leaf node
const LEAF: i32 = -1;

// ============================================================================
// ARTIFACT LAYOUT
// ============================================================================

// One regression tree in flattened-array layout
//
// All five arrays have one entry per node. Internal nodes route on
// `features[split_feature] < threshold` (left on true), leaves carry their
// contribution in `weight`. Children always sit at a higher index than their
// parent, so traversal is guaranteed to terminate.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    // Output coefficient this tree contributes to
    pub group: usize,

    pub split_feature: Vec<usize>,
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    pub weight: Vec<f64>,
}

impl Tree {
    #[inline]
    fn num_nodes(&self) -> usize {
        self.weight.len()
    }

    // Route one feature row from the root to a leaf and return its weight
    fn predict_row(&self, features: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.left[node] != LEAF {
            node = if features[self.split_feature[node]] < self.threshold[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
        }
        self.weight[node]
    }

    // Structural validation, run once at load time so predict_row can
    // index without checks
    fn validate(&self, index: usize, num_features: usize, num_outputs: usize) -> Result<(), String> {
        let n = self.num_nodes();
        if n == 0 {
            return Err(format!("tree {index} has no nodes"));
        }
        if self.split_feature.len() != n
            || self.threshold.len() != n
            || self.left.len() != n
            || self.right.len() != n
        {
            return Err(format!(
                "tree {index} node arrays disagree in length \
                 (weight={}, split_feature={}, threshold={}, left={}, right={})",
                n,
                self.split_feature.len(),
                self.threshold.len(),
                self.left.len(),
                self.right.len()
            ));
        }
        if self.group >= num_outputs {
            return Err(format!(
                "tree {index} targets output {} but the model has {num_outputs} outputs",
                self.group
            ));
        }
        for node in 0..n {
            let (l, r) = (self.left[node], self.right[node]);
            // Leaves mark both children; internal nodes mark neither
            if (l == LEAF) != (r == LEAF) {
                return Err(format!(
                    "tree {index} node {node} has exactly one leaf child marker"
                ));
            }
            if l == LEAF {
                continue;
            }
            for child in [l, r] {
                if child < 0 || child as usize >= n {
                    return Err(format!(
                        "tree {index} node {node} child {child} out of range (0..{n})"
                    ));
                }
                // Forward-only children make cycles unrepresentable
                if child as usize <= node {
                    return Err(format!(
                        "tree {index} node {node} child {child} does not advance"
                    ));
                }
            }
            if self.split_feature[node] >= num_features {
                return Err(format!(
                    "tree {index} node {node} splits on feature {} but the model \
                     has {num_features} features",
                    self.split_feature[node]
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// ENSEMBLE
// ============================================================================

// A fitted gradient-boosted ensemble mapping a feature row to one reduced
// coefficient per output group
#[derive(Debug, Clone, Deserialize)]
pub struct GradientBoostedRegressor {
    // Feature row length the booster was trained on: [time] + parameters
    pub num_features: usize,

    // Number of predicted coefficients (retained POD modes, typically 2-4)
    pub num_outputs: usize,

    // Per-output additive offset
    pub base_score: Vec<f64>,

    pub trees: Vec<Tree>,
}

impl GradientBoostedRegressor {
    // Load and validate the JSON artifact. Any structural inconsistency is
    // a Load error; a model that passes here can run inference without
    // bounds checks.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SurrogateError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| SurrogateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self = serde_json::from_str(&raw).map_err(|source| SurrogateError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        model
            .validate()
            .map_err(|reason| SurrogateError::load(path, reason))?;
        Ok(model)
    }

    // Construct from already-deserialized parts (tests, embedding)
    pub fn new(
        num_features: usize,
        num_outputs: usize,
        base_score: Vec<f64>,
        trees: Vec<Tree>,
    ) -> Result<Self, SurrogateError> {
        let model = Self {
            num_features,
            num_outputs,
            base_score,
            trees,
        };
        model
            .validate()
            .map_err(SurrogateError::DimensionMismatch)?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), String> {
        if self.num_features == 0 {
            return Err("model declares zero features".to_string());
        }
        if self.num_outputs == 0 {
            return Err("model declares zero outputs".to_string());
        }
        if self.base_score.len() != self.num_outputs {
            return Err(format!(
                "base_score has {} entries for {} outputs",
                self.base_score.len(),
                self.num_outputs
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.num_features, self.num_outputs)?;
        }
        Ok(())
    }

    // Forward pass: one reduced coefficient per output group
    //
    // The feature row must match the training layout exactly; only its
    // length is checked here (ordering is the caller's contract).
    pub fn predict(&self, features: &[f64]) -> Result<Array1<f64>, SurrogateError> {
        if features.len() != self.num_features {
            return Err(SurrogateError::DimensionMismatch(format!(
                "feature row has {} entries but the regressor expects {}",
                features.len(),
                self.num_features
            )));
        }
        let mut out = Array1::from(self.base_score.clone());
        for tree in &self.trees {
            out[tree.group] += tree.predict_row(features);
        }
        Ok(out)
    }
}
