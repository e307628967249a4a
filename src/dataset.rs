//! Index-keyed tabular dataset
//!
//! Polars frames carry no row index, so a [`Dataset`] keeps the identifier
//! column apart from the value columns. Every derived dataset (feature
//! selection, predictions) carries the same identifier series in the same
//! order as the dataset it came from.

use crate::error::{PipelineError, Result};
use polars::prelude::*;

/// Rows keyed by a unique identifier column
#[derive(Debug, Clone)]
pub struct Dataset {
    index: Series,
    frame: DataFrame,
}

impl Dataset {
    /// Build a dataset from an identifier series and its value columns.
    ///
    /// Fails if the identifier contains nulls or duplicates, or if the
    /// frame height differs from the identifier length.
    pub fn new(index: Series, frame: DataFrame) -> Result<Self> {
        if frame.width() > 0 && frame.height() != index.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} rows", index.len()),
                actual: format!("{} rows", frame.height()),
            });
        }

        if index.null_count() > 0 {
            return Err(PipelineError::DataError(format!(
                "index column '{}' contains {} missing values",
                index.name(),
                index.null_count()
            )));
        }

        let n_unique = index.n_unique()?;
        if n_unique != index.len() {
            return Err(PipelineError::DataError(format!(
                "index column '{}' has {} duplicate identifiers",
                index.name(),
                index.len() - n_unique
            )));
        }

        Ok(Self { index, frame })
    }

    /// Split `index_col` out of a frame and use it as the identifier
    pub fn from_frame(df: DataFrame, index_col: &str) -> Result<Self> {
        let index = df
            .column(index_col)
            .map_err(|_| PipelineError::ColumnNotFound(index_col.to_string()))?
            .as_materialized_series()
            .clone();
        let frame = df.drop(index_col)?;
        Self::new(index, frame)
    }

    /// Derived dataset sharing an already validated identifier
    pub(crate) fn with_frame(&self, frame: DataFrame) -> Self {
        Self {
            index: self.index.clone(),
            frame,
        }
    }

    /// Identifier series
    pub fn index(&self) -> &Series {
        &self.index
    }

    /// Identifier column name
    pub fn index_name(&self) -> &str {
        self.index.name().as_str()
    }

    /// Value columns (identifier excluded)
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.index.len()
    }

    /// Number of value columns
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Value column names in frame order
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Look up a value column
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|col| col.as_materialized_series())
            .map_err(|_| PipelineError::ColumnNotFound(name.to_string()))
    }

    /// Copy restricted to `columns`, in the given order.
    ///
    /// The first name not present in the dataset is reported as
    /// [`PipelineError::ColumnNotFound`].
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self> {
        if let Some(missing) = columns.iter().find(|c| !self.has_column(c.as_ref())) {
            return Err(PipelineError::ColumnNotFound(missing.as_ref().to_string()));
        }

        let frame = self.frame.select(columns.iter().map(|c| c.as_ref()))?;
        Ok(self.with_frame(frame))
    }

    /// Flatten back into a single frame with the identifier first
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.frame.width() + 1);
        columns.push(Column::from(self.index.clone()));
        columns.extend(self.frame.get_columns().iter().cloned());
        Ok(DataFrame::new(columns)?)
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.index.name() == other.index.name()
            && self.index.equals_missing(&other.index)
            && self.frame.equals_missing(&other.frame)
    }
}
