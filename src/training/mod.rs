//! Model training module
//!
//! Provides the estimator seam used by pipelines and the built-in
//! tree-ensemble classifier:
//! - [`Estimator`] trait and frame → matrix conversion
//! - Keyword hyperparameters ([`HyperParams`])
//! - CART decision trees and Random Forests

pub mod estimator;
pub mod params;
pub mod decision_tree;
pub mod random_forest;

pub use estimator::{Estimator, features_to_array, labels_to_array};
pub use params::{HyperParams, ParamValue};
pub use decision_tree::{DecisionTreeClassifier, TreeNode};
pub use random_forest::{RandomForestClassifier, MaxFeatures, RANDOM_FOREST_PARAMS};
