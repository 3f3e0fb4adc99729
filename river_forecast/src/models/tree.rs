//! CART regression tree
//!
//! Nodes are split greedily on the (feature, threshold) pair with the lowest
//! summed squared error of the two children. Leaves predict the mean target
//! of the training rows that reach them.

use crate::error::{ForecastError, Result};
use crate::models::Matrix;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth; `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may be split
    pub min_samples_split: usize,
    /// Minimum rows each child must keep
    pub min_samples_leaf: usize,
    /// Features drawn at random as split candidates per node
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    children_sse: f64,
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
    /// Total squared-error reduction credited to each feature
    impurity_decrease: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `sample`.
    ///
    /// `sample` may repeat rows (bootstrap draws); a repeated row counts once
    /// per occurrence.
    pub fn fit<R: Rng>(
        x: &Matrix,
        y: &[f64],
        sample: &[usize],
        config: &TreeConfig,
        rng: &mut R,
    ) -> Self {
        let mut builder = TreeBuilder {
            x,
            y,
            config,
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; x.n_cols()],
        };
        builder.grow(sample.to_vec(), 0, rng);

        Self {
            nodes: builder.nodes,
            n_features: x.n_cols(),
            impurity_decrease: builder.impurity_decrease,
        }
    }

    /// Walk the tree for one feature row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }

        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Check the node layout of a deserialized tree.
    ///
    /// Children are always numbered after their parent, so requiring
    /// `parent < child < len` also rules out cycles.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ForecastError::ModelError("tree has no nodes".to_string()));
        }
        if self.impurity_decrease.len() != self.n_features {
            return Err(ForecastError::ModelError(format!(
                "tree lists {} importances for {} features",
                self.impurity_decrease.len(),
                self.n_features
            )));
        }

        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= self.n_features {
                    return Err(ForecastError::ModelError(format!(
                        "node {} splits on feature {} but the tree has {} features",
                        id, feature, self.n_features
                    )));
                }
                for child in [*left, *right] {
                    if child <= id || child >= self.nodes.len() {
                        return Err(ForecastError::ModelError(format!(
                            "node {} points to child {} outside {}..{}",
                            id,
                            child,
                            id + 1,
                            self.nodes.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Impurity decrease per feature, normalized to sum to 1.
    /// A tree that never split reports all zeros.
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.n_features];
        }
        self.impurity_decrease.iter().map(|v| v / total).collect()
    }
}

struct TreeBuilder<'a> {
    x: &'a Matrix,
    y: &'a [f64],
    config: &'a TreeConfig,
    nodes: Vec<Node>,
    impurity_decrease: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    /// Grow the subtree for `indices` and return its root node id
    fn grow<R: Rng>(&mut self, indices: Vec<usize>, depth: usize, rng: &mut R) -> usize {
        let n = indices.len();
        let (sum, sum_sq) = indices.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let v = self.y[i];
            (s + v, sq + v * v)
        });
        let mean = if n > 0 { sum / n as f64 } else { 0.0 };

        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        let min_leaf = self.config.min_samples_leaf.max(1);
        let depth_allows = self.config.max_depth.map_or(true, |max| depth < max);
        if !depth_allows || n < self.config.min_samples_split.max(2) || n < 2 * min_leaf {
            return node_id;
        }

        let node_sse = sum_sq - sum * sum / n as f64;
        if node_sse <= 1e-12 {
            return node_id;
        }

        let Some(split) = self.best_split(&indices, sum, sum_sq, rng) else {
            return node_id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x.get(i, split.feature) <= split.threshold);

        self.impurity_decrease[split.feature] += (node_sse - split.children_sse).max(0.0);

        let left = self.grow(left_idx, depth + 1, rng);
        let right = self.grow(right_idx, depth + 1, rng);

        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split<R: Rng>(
        &self,
        indices: &[usize],
        total_sum: f64,
        total_sq: f64,
        rng: &mut R,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let n_features = self.x.n_cols();
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut features: Vec<usize> = (0..n_features).collect();
        let max_features = self.config.max_features.clamp(1, n_features.max(1));
        if max_features < n_features {
            features.shuffle(rng);
            features.truncate(max_features);
        }

        let mut order = indices.to_vec();
        let mut best: Option<SplitCandidate> = None;

        for &feature in &features {
            order.sort_by(|&a, &b| self.x.get(a, feature).total_cmp(&self.x.get(b, feature)));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for pos in 0..n - 1 {
                let v = self.y[order[pos]];
                left_sum += v;
                left_sq += v * v;

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let current = self.x.get(order[pos], feature);
                let next = self.x.get(order[pos + 1], feature);
                // equal values cannot be separated by a threshold
                if next <= current {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let children_sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);

                if best.map_or(true, |b| children_sse < b.children_sse) {
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        children_sse,
                    });
                }
            }
        }

        best
    }
}
