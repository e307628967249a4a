//! CART classification tree (Gini impurity)
//!
//! Trees here are the forest's building block: labels arrive already
//! encoded as class indices `0..n_classes`, and leaves store the class
//! distribution of the samples that reached them.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::Rng;

/// Decision tree node
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// Leaf node with class probabilities
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Classification tree
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    root: Option<TreeNode>,
    /// Maximum depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn per split (None = all)
    pub max_features: Option<usize>,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

/// Split threshold in `[current, next)`; halves first so values near
/// `f64::MAX` do not overflow.
fn midpoint(current: f64, next: f64) -> f64 {
    let mid = current / 2.0 + next / 2.0;
    if mid >= current && mid < next {
        mid
    } else {
        current
    }
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_features: 0,
            n_classes: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set the number of candidate features per split
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Grow the tree on the rows listed in `indices` (repeats allowed).
    pub fn fit<R: Rng>(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        indices: &[usize],
        rng: &mut R,
    ) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if indices.is_empty() {
            return Err(PipelineError::TrainingError(
                "cannot grow a tree from zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.n_classes = n_classes;

        let mut importances = vec![0.0; self.n_features];
        let root = self.grow(x, y, indices.to_vec(), 0, &mut importances, rng);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }

        self.root = Some(root);
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn class_counts(&self, y: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn leaf(counts: &[usize], n_samples: usize) -> TreeNode {
        let n = n_samples.max(1) as f64;
        TreeNode::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / n).collect(),
            n_samples,
        }
    }

    fn grow<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
        rng: &mut R,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(y, &indices);
        let impurity = gini(&counts, n_samples);

        let should_stop = impurity == 0.0
            || n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d);

        if should_stop {
            return Self::leaf(&counts, n_samples);
        }

        let Some(best) = self.best_split(x, y, &indices, &counts, impurity, rng) else {
            return Self::leaf(&counts, n_samples);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        if left_idx.is_empty() || right_idx.is_empty() {
            return Self::leaf(&counts, n_samples);
        }

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = self.grow(x, y, left_idx, depth + 1, importances, rng);
        let right = self.grow(x, y, right_idx, depth + 1, importances, rng);

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
            n_samples,
        }
    }

    /// Sweep each candidate feature in sorted order, moving one sample at a
    /// time from the right partition to the left.
    fn best_split<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
        rng: &mut R,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let k = self
            .max_features
            .unwrap_or(self.n_features)
            .clamp(1, self.n_features.max(1));
        let candidates = sample(rng, self.n_features, k.min(self.n_features));

        let mut best: Option<SplitCandidate> = None;
        let mut sorted = indices.to_vec();

        for feature_idx in candidates.into_iter() {
            sorted.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for pos in 0..n - 1 {
                let class = y[sorted[pos]];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let current = x[[sorted[pos], feature_idx]];
                let next = x[[sorted[pos + 1], feature_idx]];
                if current == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold: midpoint(current, next),
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Class distribution of the leaf reached by `row`
    pub fn predict_row_proba(&self, row: ArrayView1<f64>) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Class probabilities, shape `(n_rows, n_classes)`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let dist = self.predict_row_proba(row)?;
            proba.row_mut(i).assign(&ArrayView1::from(dist));
        }
        Ok(proba)
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Depth of the grown tree (0 for a single leaf)
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fit_tree(tree: &mut DecisionTreeClassifier, x: &Array2<f64>, y: &[usize], n_classes: usize) {
        let indices: Vec<usize> = (0..y.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        tree.fit(x, y, n_classes, &indices, &mut rng).unwrap();
    }

    #[test]
    fn test_separable_data() {
        let x = array![[0.0, 5.0], [0.2, 1.0], [0.4, 3.0], [1.0, 2.0], [1.2, 4.0], [1.4, 0.0]];
        let y = [0, 0, 0, 1, 1, 1];

        let mut tree = DecisionTreeClassifier::new();
        fit_tree(&mut tree, &x, &y, 2);

        let proba = tree.predict_proba(&x).unwrap();
        for (i, &class) in y.iter().enumerate() {
            assert_eq!(proba[[i, class]], 1.0);
        }
        assert_eq!(tree.depth(), Some(1));

        let importances = tree.feature_importances().unwrap();
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]];
        let y = [0, 1, 0, 1, 0, 1, 0, 1];

        let mut tree = DecisionTreeClassifier::new().with_max_depth(Some(2));
        fit_tree(&mut tree, &x, &y, 2);
        assert!(tree.depth().unwrap() <= 2);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [0, 1, 1, 1];

        let mut tree = DecisionTreeClassifier::new().with_min_samples_leaf(2);
        fit_tree(&mut tree, &x, &y, 2);

        if let Some(TreeNode::Split { left, right, .. }) = tree.root() {
            for child in [left, right] {
                match &**child {
                    TreeNode::Leaf { n_samples, .. } | TreeNode::Split { n_samples, .. } => {
                        assert!(*n_samples >= 2)
                    }
                }
            }
        }
    }

    fn assert_children_non_empty(node: &TreeNode) {
        if let TreeNode::Split { left, right, .. } = node {
            for child in [left, right] {
                match &**child {
                    TreeNode::Leaf { n_samples, .. } => assert!(*n_samples > 0),
                    split => assert_children_non_empty(split),
                }
            }
        }
    }

    #[test]
    fn test_extreme_values_terminate() {
        let x = array![[0.0], [1e308], [1.7e308]];
        let y = [0, 0, 1];

        let mut tree = DecisionTreeClassifier::new();
        fit_tree(&mut tree, &x, &y, 2);

        let root = tree.root().unwrap();
        assert_children_non_empty(root);
        match root {
            TreeNode::Split { threshold, .. } => {
                assert!(threshold.is_finite());
                assert!(*threshold >= 1e308 && *threshold < 1.7e308);
            }
            TreeNode::Leaf { .. } => panic!("expected a split"),
        }

        let proba = tree.predict_proba(&x).unwrap();
        for (i, &class) in y.iter().enumerate() {
            assert_eq!(proba[[i, class]], 1.0);
        }
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(midpoint(1.0, 3.0), 2.0);
        let mid = midpoint(1e308, 1.7e308);
        assert!(mid > 1e308 && mid < 1.7e308);
        assert_eq!(midpoint(f64::MIN, f64::MAX), 0.0);

        let next = 1.0f64;
        let current = f64::from_bits(next.to_bits() - 1);
        assert_eq!(midpoint(current, next), current);
    }

    #[test]
    fn test_unfitted_predict() {
        let tree = DecisionTreeClassifier::new();
        let x = array![[1.0]];
        assert!(matches!(tree.predict_proba(&x), Err(PipelineError::ModelNotFitted)));
    }
}
