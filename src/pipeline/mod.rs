//! Fit/predict pipelines
//!
//! - [`Pipeline`] - the transform + train contract, with [`Fitted`] results
//! - [`GeneralPipeline`] - column selection over any [`crate::training::Estimator`]
//! - [`RandomForestPipelineV1`] - fixed random forest preset

mod base;
mod general;
mod presets;

pub use base::{Fitted, Pipeline, PipelineSession};
pub use general::{GeneralPipeline, PREDICTION_COL};
pub use presets::{random_forest_v1_params, RandomForestPipelineV1, RANDOM_FOREST_V1_FEATURES};
