//! Survival pipeline - fit/predict wrapper for tabular passenger data
//!
//! This crate provides:
//! - Index-keyed datasets loaded from CSV
//! - A fit/predict pipeline contract and a feature-selection pipeline over
//!   any estimator
//! - A random forest classifier and a fixed preset pipeline built on it
//!
//! # Modules
//!
//! - [`dataset`] - Rows keyed by a unique identifier column
//! - [`utils`] - CSV loading and saving
//! - [`config`] - Data file locations
//! - [`training`] - Estimator trait, hyperparameters, decision trees, random forest
//! - [`pipeline`] - Pipeline contract, general pipeline, presets
//!
//! ```no_run
//! use survival_pipeline::prelude::*;
//!
//! # fn main() -> survival_pipeline::Result<()> {
//! let config = DataConfig::default();
//! let (train, test) = DataLoader::from_config(&config).load_train_test(&config)?;
//!
//! let fitted = RandomForestPipelineV1::random_forest_v1().fit(&train, &config.target_col)?;
//! let predictions = fitted.predict(&test)?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod config;
pub mod dataset;
pub mod utils;

// Core ML modules
pub mod training;
pub mod pipeline;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Data
    pub use crate::config::DataConfig;
    pub use crate::dataset::Dataset;
    pub use crate::utils::{DataLoader, DataSaver};

    // Training
    pub use crate::training::{Estimator, HyperParams, ParamValue, RandomForestClassifier};

    // Pipelines
    pub use crate::pipeline::{
        Fitted, GeneralPipeline, Pipeline, PipelineSession, RandomForestPipelineV1, PREDICTION_COL,
    };
}
