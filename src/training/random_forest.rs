//! Random forest classifier

use super::decision_tree::DecisionTreeClassifier;
use super::estimator::{features_to_array, labels_to_array, Estimator};
use super::params::{HyperParams, ParamValue};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Hyperparameters accepted by [`RandomForestClassifier::from_params`]
pub const RANDOM_FOREST_PARAMS: &[&str] = &[
    "n_estimators",
    "max_depth",
    "min_samples_split",
    "min_samples_leaf",
    "max_features",
    "bootstrap",
    "random_state",
    "n_jobs",
];

/// Strategy for features considered per split
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt() as usize,
            MaxFeatures::Log2 => n.log2() as usize,
            MaxFeatures::Fraction(f) => (n * f) as usize,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }

    fn from_param(value: Option<&ParamValue>) -> Result<Self> {
        match value {
            None => Ok(MaxFeatures::Sqrt),
            Some(ParamValue::Null) => Ok(MaxFeatures::All),
            Some(ParamValue::Str(s)) if s == "sqrt" => Ok(MaxFeatures::Sqrt),
            Some(ParamValue::Str(s)) if s == "log2" => Ok(MaxFeatures::Log2),
            Some(ParamValue::Int(k)) if *k >= 1 => Ok(MaxFeatures::Fixed(*k as usize)),
            Some(ParamValue::Float(f)) if *f > 0.0 && *f <= 1.0 => Ok(MaxFeatures::Fraction(*f)),
            Some(other) => Err(PipelineError::invalid_param(
                "max_features",
                other,
                "expected 'sqrt', 'log2', a positive integer, a fraction in (0, 1] or None",
            )),
        }
    }
}

/// Bagged ensemble of Gini classification trees voting with their leaf
/// class distributions.
///
/// Labels must be numeric; predictions come back in the label's dtype.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Base seed; tree `i` uses `seed + i`
    pub random_state: Option<u64>,
    /// Worker count: -1 = all, n > 0 = n workers, n < -1 = all but |n| - 1
    pub n_jobs: Option<i64>,
    trees: Vec<DecisionTreeClassifier>,
    classes: Vec<f64>,
    label_dtype: Option<DataType>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
    pool: Option<Arc<ThreadPool>>,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestClassifier {
    /// Create a new forest with `n_estimators` trees
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: None,
            n_jobs: None,
            trees: Vec::new(),
            classes: Vec::new(),
            label_dtype: None,
            n_features: 0,
            feature_importances: None,
            pool: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Set worker count
    pub fn with_n_jobs(mut self, n_jobs: i64) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Enable or disable bootstrap sampling
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    fn n_workers(&self) -> usize {
        let available = rayon::current_num_threads() as i64;
        match self.n_jobs {
            None => 1,
            Some(n) if n > 0 => n as usize,
            Some(n) => (available + 1 + n).max(1) as usize,
        }
    }

    /// Dedicated pool for `n_jobs`; `None` when the global pool or a single
    /// worker is used.
    fn build_pool(&self) -> Result<Option<Arc<ThreadPool>>> {
        if self.n_jobs == Some(-1) || self.n_workers() == 1 {
            return Ok(None);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.n_workers())
            .build()
            .map_err(|e| PipelineError::TrainingError(format!("thread pool: {}", e)))?;
        Ok(Some(Arc::new(pool)))
    }

    /// Apply `op` to every item, sequentially for one worker and on the
    /// forest's pool (or rayon's global pool) otherwise.
    fn map_parallel<I, T, F>(&self, items: Vec<I>, op: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I) -> Result<T> + Send + Sync,
    {
        if self.n_workers() == 1 {
            return items.into_iter().map(op).collect();
        }

        let run = || -> Result<Vec<T>> { items.into_par_iter().map(&op).collect() };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn grow_trees(&self, x: &Array2<f64>, y: &[usize], base_seed: u64) -> Result<Vec<DecisionTreeClassifier>> {
        let n_samples = x.nrows();
        let max_features = self.max_features.resolve(x.ncols());
        let n_classes = self.classes.len();

        self.map_parallel((0..self.n_estimators).collect(), |tree_idx: usize| {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

            let sample_indices: Vec<usize> = if self.bootstrap {
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };

            let mut tree = DecisionTreeClassifier::new()
                .with_max_depth(self.max_depth)
                .with_min_samples_split(self.min_samples_split)
                .with_min_samples_leaf(self.min_samples_leaf)
                .with_max_features(Some(max_features));
            tree.fit(x, y, n_classes, &sample_indices, &mut rng)?;
            Ok(tree)
        })
    }

    fn compute_feature_importances(&mut self) {
        let mut total = Array1::<f64>::zeros(self.n_features);
        for imp in self.trees.iter().filter_map(|t| t.feature_importances()) {
            total += imp;
        }

        let sum = total.sum();
        if sum > 0.0 {
            total /= sum;
        }
        self.feature_importances = Some(total);
    }

    fn check_fitted(&self, x: &Array2<f64>) -> Result<()> {
        if self.trees.is_empty() {
            return Err(PipelineError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Average of per-tree class distributions, shape `(n_rows, n_classes)`
    pub fn predict_proba_array(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_fitted(x)?;

        let per_tree = self.map_parallel(self.trees.iter().collect(), |tree: &DecisionTreeClassifier| {
            tree.predict_proba(x)
        })?;

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for p in &per_tree {
            proba += p;
        }
        proba /= per_tree.len() as f64;
        Ok(proba)
    }

    /// Majority class per row, as label values
    pub fn predict_array(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba_array(x)?;
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc })
                    .0;
                self.classes[best]
            })
            .collect())
    }

    /// Class probabilities for each row of `features`, columns ordered as [`Self::classes`]
    pub fn predict_proba(&self, features: &DataFrame) -> Result<Array2<f64>> {
        self.predict_proba_array(&features_to_array(features)?)
    }

    /// Sorted distinct label values seen during fit
    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Mean impurity decrease per feature, normalized to sum to 1
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTreeClassifier] {
        &self.trees
    }
}

impl Estimator for RandomForestClassifier {
    fn from_params(params: &HyperParams) -> Result<Self> {
        params.ensure_known(RANDOM_FOREST_PARAMS)?;

        let n_estimators = params.get_usize("n_estimators")?.unwrap_or(100);
        if n_estimators == 0 {
            return Err(PipelineError::invalid_param("n_estimators", 0, "must be at least 1"));
        }

        let max_depth = params.get_usize("max_depth")?;
        if max_depth == Some(0) {
            return Err(PipelineError::invalid_param("max_depth", 0, "must be at least 1 or None"));
        }

        let min_samples_split = params.get_usize("min_samples_split")?.unwrap_or(2);
        if min_samples_split < 2 {
            return Err(PipelineError::invalid_param(
                "min_samples_split",
                min_samples_split,
                "must be at least 2",
            ));
        }

        let min_samples_leaf = params.get_usize("min_samples_leaf")?.unwrap_or(1);
        if min_samples_leaf == 0 {
            return Err(PipelineError::invalid_param("min_samples_leaf", 0, "must be at least 1"));
        }

        let n_jobs = params.get_i64("n_jobs")?;
        if n_jobs == Some(0) {
            return Err(PipelineError::invalid_param("n_jobs", 0, "must be non-zero or None"));
        }

        Ok(Self {
            max_depth,
            min_samples_split,
            min_samples_leaf,
            max_features: MaxFeatures::from_param(params.get("max_features"))?,
            bootstrap: params.get_bool("bootstrap")?.unwrap_or(true),
            random_state: params.get_u64("random_state")?,
            n_jobs,
            ..Self::new(n_estimators)
        })
    }

    fn fit(&mut self, features: &DataFrame, labels: &Series) -> Result<()> {
        let start = Instant::now();
        let x = features_to_array(features)?;
        let y = labels_to_array(labels)?;

        if x.nrows() != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(PipelineError::TrainingError(
                "cannot fit a forest on zero samples".to_string(),
            ));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(f64::total_cmp);
        classes.dedup();
        let encoded: Vec<usize> = y
            .iter()
            .map(|v| classes.partition_point(|c| c < v))
            .collect();

        self.classes = classes;
        self.label_dtype = Some(labels.dtype().clone());
        self.n_features = x.ncols();

        let base_seed = self.random_state.unwrap_or_else(rand::random);
        debug!(
            n_estimators = self.n_estimators,
            workers = self.n_workers(),
            seed = base_seed,
            "Growing forest"
        );

        self.pool = self.build_pool()?;
        self.trees = self.grow_trees(&x, &encoded, base_seed)?;
        self.compute_feature_importances();

        info!(
            n_trees = self.trees.len(),
            n_samples = x.nrows(),
            n_features = x.ncols(),
            n_classes = self.classes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Random forest fitted"
        );

        Ok(())
    }

    fn predict(&self, features: &DataFrame) -> Result<Series> {
        let predictions = self.predict_array(&features_to_array(features)?)?;
        let series = Series::new("prediction".into(), predictions.to_vec());

        match &self.label_dtype {
            Some(dtype) => Ok(series.cast(dtype)?),
            None => Ok(series),
        }
    }
}
