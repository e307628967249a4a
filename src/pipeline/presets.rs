//! Named pipeline presets

use super::general::GeneralPipeline;
use crate::training::{HyperParams, RandomForestClassifier};

/// Raw passenger columns used by [`RandomForestPipelineV1`], in order
pub const RANDOM_FOREST_V1_FEATURES: [&str; 9] = [
    "Pclass", "Sex", "Age", "SibSp", "Parch", "Ticket", "Fare", "Cabin", "Embarked",
];

/// Random forest over the nine raw passenger columns with fixed hyperparameters
pub type RandomForestPipelineV1 = GeneralPipeline<RandomForestClassifier>;

/// 200 trees of depth at most 6, seed 42, all available workers
pub fn random_forest_v1_params() -> HyperParams {
    HyperParams::new()
        .with("n_estimators", 200)
        .with("max_depth", 6)
        .with("random_state", 42)
        .with("n_jobs", -1)
}

impl GeneralPipeline<RandomForestClassifier> {
    /// The fixed random forest preset; takes no configuration
    pub fn random_forest_v1() -> Self {
        Self::with_params(RANDOM_FOREST_V1_FEATURES, random_forest_v1_params())
    }
}

impl Default for GeneralPipeline<RandomForestClassifier> {
    fn default() -> Self {
        Self::random_forest_v1()
    }
}
