//! Isolation Forest for unsupervised risk scoring
//!
//! Isolation Forest isolates anomalies by randomly partitioning the feature space.
//! Anomalies are easier to isolate (shorter paths in trees) compared to normal points.
//!
//! Each tree draws its randomness from its own generator, seeded from the
//! master seed and the tree index, so a forest is reproducible whether its
//! trees are built on one thread or many.
//!
//! # References
//!
//! Liu, F. T., Ting, K. M., & Zhou, Z. H. (2008). Isolation forest.
//! In 2008 Eighth IEEE International Conference on Data Mining (pp. 413-422).

use crate::error::{Result, RiskError};
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Default sub-sampling size (following original paper)
pub const DEFAULT_SUBSAMPLE_SIZE: usize = 256;

/// Default number of trees
pub const DEFAULT_NUM_TREES: usize = 300;

/// Default master seed
pub const DEFAULT_SEED: u64 = 42;

const EULER_GAMMA: f64 = 0.5772156649;

/// Expected path length of an unsuccessful BST search over `n` items
///
/// `c(n) = 2 * (ln(n - 1) + γ) - 2 * (n - 1) / n` for `n > 1`, else 0.
pub fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n_minus_one = (n - 1) as f64;
    2.0 * (n_minus_one.ln() + EULER_GAMMA) - 2.0 * n_minus_one / n as f64
}

/// Per-tree seed derived from the master seed (SplitMix64 finalizer)
fn tree_seed(master_seed: u64, tree_index: usize) -> u64 {
    let mut z = master_seed
        .wrapping_add((tree_index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A node in an Isolation Tree
#[derive(Debug, Clone, PartialEq)]
enum IsolationNode {
    /// Internal node with split feature and threshold
    Internal {
        feature_idx: usize,
        threshold: f64,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    /// Leaf node with sample count (for path length calculation)
    Leaf { size: usize },
}

impl IsolationNode {
    /// Calculate path length from root to this node for a given sample
    fn path_length(&self, sample: &[f64], current_depth: usize) -> f64 {
        match self {
            IsolationNode::Internal {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                if sample[*feature_idx] < *threshold {
                    left.path_length(sample, current_depth + 1)
                } else {
                    right.path_length(sample, current_depth + 1)
                }
            }
            IsolationNode::Leaf { size } => {
                // Add average path length for unresolved instances
                current_depth as f64 + average_path_length(*size)
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            IsolationNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
            IsolationNode::Leaf { .. } => 0,
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            IsolationNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
            IsolationNode::Leaf { .. } => 1,
        }
    }
}

/// Single Isolation Tree
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationTree {
    root: IsolationNode,
}

/// Recursive tree construction over row indices of a shared matrix
struct TreeBuilder<'a> {
    samples: &'a [Vec<f64>],
    max_depth: usize,
    rng: StdRng,
}

impl TreeBuilder<'_> {
    fn build_node(&mut self, rows: Vec<usize>, depth: usize) -> IsolationNode {
        if depth >= self.max_depth || rows.len() <= 1 {
            return IsolationNode::Leaf { size: rows.len() };
        }

        // Only features that still vary inside this node can split it
        let num_features = self.samples[rows[0]].len();
        let mut candidates = Vec::with_capacity(num_features);
        for feature_idx in 0..num_features {
            let mut min_val = f64::INFINITY;
            let mut max_val = f64::NEG_INFINITY;
            for &row in &rows {
                let val = self.samples[row][feature_idx];
                min_val = min_val.min(val);
                max_val = max_val.max(val);
            }
            if max_val > min_val {
                candidates.push((feature_idx, min_val, max_val));
            }
        }

        // All samples are identical - create leaf
        if candidates.is_empty() {
            return IsolationNode::Leaf { size: rows.len() };
        }

        let (feature_idx, min_val, max_val) = candidates[self.rng.gen_range(0..candidates.len())];

        // Random split threshold strictly between min and max
        let u: f64 = self.rng.sample(Open01);
        let threshold = min_val + u * (max_val - min_val);

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&row| self.samples[row][feature_idx] < threshold);

        // Rounding can push the threshold onto an endpoint
        if left_rows.is_empty() || right_rows.is_empty() {
            return IsolationNode::Leaf { size: rows.len() };
        }

        let left = Box::new(self.build_node(left_rows, depth + 1));
        let right = Box::new(self.build_node(right_rows, depth + 1));

        IsolationNode::Internal {
            feature_idx,
            threshold,
            left,
            right,
        }
    }
}

impl IsolationTree {
    /// Build a tree over a random subsample of `samples`
    fn build(samples: &[Vec<f64>], subsample_size: usize, max_depth: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = rand::seq::index::sample(&mut rng, samples.len(), subsample_size).into_vec();

        let mut builder = TreeBuilder {
            samples,
            max_depth,
            rng,
        };
        IsolationTree {
            root: builder.build_node(rows, 0),
        }
    }

    /// Calculate path length for a sample
    pub fn path_length(&self, sample: &[f64]) -> f64 {
        self.root.path_length(sample, 0)
    }

    /// Number of internal levels on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }
}

/// Hyperparameters for fitting an [`IsolationForest`]
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub num_trees: usize,
    pub subsample_size: usize,
    /// Defaults to `ceil(log2(effective subsample size))`
    pub max_depth: Option<usize>,
    pub seed: u64,
    /// Build trees on the rayon thread pool
    pub parallel: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            num_trees: DEFAULT_NUM_TREES,
            subsample_size: DEFAULT_SUBSAMPLE_SIZE,
            max_depth: None,
            seed: DEFAULT_SEED,
            parallel: true,
        }
    }
}

impl ForestParams {
    pub fn new(num_trees: usize) -> Self {
        Self {
            num_trees,
            ..Self::default()
        }
    }

    pub fn with_subsample_size(mut self, subsample_size: usize) -> Self {
        self.subsample_size = subsample_size;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Isolation Forest - ensemble of Isolation Trees
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    num_features: usize,
    subsample_size: usize,
    max_depth: usize,
}

impl IsolationForest {
    /// Fit the forest on a feature matrix (one row per sample)
    pub fn fit(samples: &[Vec<f64>], params: &ForestParams) -> Result<Self> {
        if samples.is_empty() {
            return Err(RiskError::DegenerateInput(
                "feature matrix has zero rows".to_string(),
            ));
        }
        let num_features = samples[0].len();
        if num_features == 0 {
            return Err(RiskError::DegenerateInput(
                "feature matrix has zero columns".to_string(),
            ));
        }
        if let Some(i) = samples.iter().position(|row| row.len() != num_features) {
            return Err(RiskError::Schema(format!(
                "row {} has {} features, expected {}",
                i,
                samples[i].len(),
                num_features
            )));
        }
        if params.num_trees == 0 || params.subsample_size == 0 {
            return Err(RiskError::DegenerateInput(format!(
                "forest needs at least one tree and one sample per tree (trees={}, subsample={})",
                params.num_trees, params.subsample_size
            )));
        }

        let subsample_size = params.subsample_size.min(samples.len());
        let max_depth = params
            .max_depth
            .unwrap_or_else(|| (subsample_size as f64).log2().ceil() as usize);

        let build = |tree_index: usize| {
            IsolationTree::build(
                samples,
                subsample_size,
                max_depth,
                tree_seed(params.seed, tree_index),
            )
        };

        let trees: Vec<IsolationTree> = if params.parallel {
            (0..params.num_trees).into_par_iter().map(build).collect()
        } else {
            (0..params.num_trees).map(build).collect()
        };

        tracing::info!(
            "Fitted isolation forest: {} trees, subsample {}, max depth {}, {} features",
            trees.len(),
            subsample_size,
            max_depth,
            num_features
        );

        Ok(IsolationForest {
            trees,
            num_features,
            subsample_size,
            max_depth,
        })
    }

    /// Mean path length across all trees, including leaf corrections
    pub fn average_path(&self, sample: &[f64]) -> Result<f64> {
        if sample.len() != self.num_features {
            return Err(RiskError::Schema(format!(
                "sample has {} features, forest was fitted on {}",
                sample.len(),
                self.num_features
            )));
        }

        let total: f64 = self.trees.iter().map(|tree| tree.path_length(sample)).sum();
        Ok(total / self.trees.len() as f64)
    }

    /// Calculate anomaly score for a sample (higher = more anomalous)
    ///
    /// Returns `2^(-E[h(x)] / c(ψ))` with ψ the effective subsample size.
    /// With ψ = 1 the normalizer is zero and the ratio is taken as 1.
    pub fn anomaly_score(&self, sample: &[f64]) -> Result<f64> {
        let avg_path_length = self.average_path(sample)?;

        let c = average_path_length(self.subsample_size);
        let ratio = if c > 0.0 { avg_path_length / c } else { 1.0 };
        Ok(2_f64.powf(-ratio))
    }

    /// Score every row of a matrix, preserving row order
    pub fn score_samples(&self, samples: &[Vec<f64>]) -> Result<Vec<f64>> {
        samples
            .par_iter()
            .map(|sample| self.anomaly_score(sample))
            .collect()
    }

    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Subsample size actually used per tree
    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
