//! Two-phase fit/predict contract
//!
//! A [`Pipeline`] only describes how to transform raw rows and how to train
//! a predictor on the result. Training produces a [`Fitted`] value that
//! owns the trained predictor, so prediction without a model cannot be
//! expressed. [`PipelineSession`] wraps the same contract in a mutable
//! holder for callers that want to fit in place and replace the model
//! later.

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fmt;
use tracing::{debug, info};

/// Shape every concrete pipeline satisfies
pub trait Pipeline: Clone {
    /// Trained predictor produced by [`Pipeline::fit_predictor`]
    type Predictor;

    /// Convert raw rows into the estimator's input
    fn transform(&self, data: &Dataset) -> Result<Dataset>;

    /// Train a fresh predictor on transformed rows and their labels
    fn fit_predictor(&self, transformed: &Dataset, labels: &Series) -> Result<Self::Predictor>;

    /// Transform `data` as at training time and predict with `predictor`,
    /// keeping the input's identifiers and row order
    fn predict_with(&self, predictor: &Self::Predictor, data: &Dataset) -> Result<Dataset>;

    /// Extract `target_col`, transform, train and return the fitted pipeline
    fn fit(&self, data: &Dataset, target_col: &str) -> Result<Fitted<Self>> {
        let labels = data.column(target_col)?.clone();
        let transformed_train_data = self.transform(data)?;

        debug!(
            rows = transformed_train_data.height(),
            features = transformed_train_data.width(),
            target_col,
            "Fitting predictor"
        );

        let predictor = self.fit_predictor(&transformed_train_data, &labels)?;

        Ok(Fitted {
            pipeline: self.clone(),
            transformed_train_data,
            labels,
            predictor,
        })
    }
}

/// A pipeline together with the predictor it trained
#[derive(Debug, Clone)]
pub struct Fitted<P: Pipeline> {
    pipeline: P,
    transformed_train_data: Dataset,
    labels: Series,
    predictor: P::Predictor,
}

impl<P: Pipeline> Fitted<P> {
    /// Predict on new rows with the stored predictor
    pub fn predict(&self, data: &Dataset) -> Result<Dataset> {
        self.pipeline.predict_with(&self.predictor, data)
    }

    /// Train again on new data, replacing this model
    pub fn refit(self, data: &Dataset, target_col: &str) -> Result<Fitted<P>> {
        self.pipeline.fit(data, target_col)
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn predictor(&self) -> &P::Predictor {
        &self.predictor
    }

    /// Training rows after `transform`
    pub fn transformed_train_data(&self) -> &Dataset {
        &self.transformed_train_data
    }

    /// Training labels as extracted from the target column
    pub fn labels(&self) -> &Series {
        &self.labels
    }

    pub fn into_predictor(self) -> P::Predictor {
        self.predictor
    }
}

/// Mutable holder for at most one trained model
pub struct PipelineSession<P: Pipeline> {
    pipeline: P,
    fitted: Option<Fitted<P>>,
}

impl<P: Pipeline> PipelineSession<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            fitted: None,
        }
    }

    /// Train and store a new model, replacing any previous one.
    ///
    /// On failure the previously trained model, if any, is kept.
    pub fn fit(&mut self, data: &Dataset, target_col: &str) -> Result<&P::Predictor> {
        let replaced = self.fitted.is_some();
        let fitted = self.pipeline.fit(data, target_col)?;
        info!(rows = data.height(), replaced, "Pipeline fitted");
        Ok(self.fitted.insert(fitted).predictor())
    }

    /// Predict with the current model; fails before the first fit
    pub fn predict(&self, data: &Dataset) -> Result<Dataset> {
        self.fitted
            .as_ref()
            .ok_or(PipelineError::ModelNotFitted)?
            .predict(data)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn trained_model(&self) -> Option<&P::Predictor> {
        self.fitted.as_ref().map(Fitted::predictor)
    }

    pub fn transformed_train_data(&self) -> Option<&Dataset> {
        self.fitted.as_ref().map(Fitted::transformed_train_data)
    }

    pub fn fitted(&self) -> Option<&Fitted<P>> {
        self.fitted.as_ref()
    }

    pub fn into_fitted(self) -> Option<Fitted<P>> {
        self.fitted
    }
}

impl<P: Pipeline + fmt::Debug> fmt::Debug for PipelineSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSession")
            .field("pipeline", &self.pipeline)
            .field("fitted", &self.is_fitted())
            .finish()
    }
}
