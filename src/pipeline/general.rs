//! Feature-selection pipeline over a pluggable estimator

use super::base::Pipeline;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::training::{Estimator, HyperParams, ParamValue};
use polars::prelude::*;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// Name of the single column in prediction output
pub const PREDICTION_COL: &str = "prediction";

/// Selects the configured feature columns and delegates training and
/// prediction to a fresh `E` built from the configured hyperparameters.
///
/// The transform is column selection only: no imputation and no encoding.
pub struct GeneralPipeline<E> {
    feature_cols: Vec<String>,
    params: HyperParams,
    _estimator: PhantomData<fn() -> E>,
}

impl<E: Estimator> GeneralPipeline<E> {
    /// Pipeline over `feature_cols` with no hyperparameters
    pub fn new<I, S>(feature_cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_params(feature_cols, HyperParams::new())
    }

    /// Pipeline over `feature_cols` constructing `E` from `params`
    pub fn with_params<I, S>(feature_cols: I, params: HyperParams) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature_cols: feature_cols.into_iter().map(Into::into).collect(),
            params,
            _estimator: PhantomData,
        }
    }

    /// Add or overwrite one hyperparameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Configured feature columns, in selection order
    pub fn feature_cols(&self) -> &[String] {
        &self.feature_cols
    }

    /// Hyperparameters passed to the estimator constructor
    pub fn params(&self) -> &HyperParams {
        &self.params
    }

    /// New, untrained estimator
    pub fn build_estimator(&self) -> Result<E> {
        E::from_params(&self.params)
    }
}

impl<E: Estimator> Pipeline for GeneralPipeline<E> {
    type Predictor = E;

    fn transform(&self, data: &Dataset) -> Result<Dataset> {
        data.select(&self.feature_cols)
    }

    fn fit_predictor(&self, transformed: &Dataset, labels: &Series) -> Result<E> {
        let mut estimator = self.build_estimator()?;
        estimator.fit(transformed.frame(), labels)?;
        Ok(estimator)
    }

    fn predict_with(&self, predictor: &E, data: &Dataset) -> Result<Dataset> {
        let transformed = self.transform(data)?;
        let predictions = predictor.predict(transformed.frame())?;

        if predictions.len() != data.height() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} predictions", data.height()),
                actual: format!("{} predictions", predictions.len()),
            });
        }

        debug!(rows = predictions.len(), "Predicted");

        let predictions = predictions.with_name(PREDICTION_COL.into());
        let frame = DataFrame::new(vec![Column::from(predictions)])?;
        Dataset::new(data.index().clone(), frame)
    }
}

impl<E> Clone for GeneralPipeline<E> {
    fn clone(&self) -> Self {
        Self {
            feature_cols: self.feature_cols.clone(),
            params: self.params.clone(),
            _estimator: PhantomData,
        }
    }
}

impl<E> fmt::Debug for GeneralPipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralPipeline")
            .field("estimator", &std::any::type_name::<E>())
            .field("feature_cols", &self.feature_cols)
            .field("params", &self.params)
            .finish()
    }
}
