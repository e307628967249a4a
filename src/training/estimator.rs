//! Estimator seam and frame → matrix conversion

use super::params::HyperParams;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// A trainable model constructed from keyword hyperparameters.
///
/// Pipelines create one fresh estimator per fit via [`Estimator::from_params`],
/// train it on the selected feature columns and keep it for prediction.
pub trait Estimator: Sized + Send + Sync {
    /// Construct an untrained estimator; unknown or ill-typed parameters fail
    fn from_params(params: &HyperParams) -> Result<Self>;

    /// Train on `features` (one row per sample) against `labels`
    fn fit(&mut self, features: &DataFrame, labels: &Series) -> Result<()>;

    /// One prediction per row of `features`, in row order
    fn predict(&self, features: &DataFrame) -> Result<Series>;
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Boolean
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
    )
}

fn series_to_f64(series: &Series) -> Result<Vec<f64>> {
    if !is_numeric(series.dtype()) {
        return Err(PipelineError::TrainingError(format!(
            "could not convert column '{}' of type {} to float",
            series.name(),
            series.dtype()
        )));
    }

    if series.null_count() > 0 {
        return Err(PipelineError::TrainingError(format!(
            "column '{}' contains {} missing values",
            series.name(),
            series.null_count()
        )));
    }

    let casted = series.cast(&DataType::Float64)?;
    let values: Vec<f64> = casted.f64()?.into_no_null_iter().collect();

    let non_finite = values.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        return Err(PipelineError::TrainingError(format!(
            "column '{}' contains {} NaN or infinite values",
            series.name(),
            non_finite
        )));
    }

    Ok(values)
}

/// Numeric feature columns as a row-major `(n_rows, n_cols)` matrix.
///
/// Non-numeric columns, missing values and NaN/infinite values are rejected
/// rather than coerced.
pub fn features_to_array(features: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = features.height();

    let col_data: Vec<Vec<f64>> = features
        .get_columns()
        .iter()
        .map(|col| series_to_f64(col.as_materialized_series()))
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((n_rows, col_data.len()), |(r, c)| col_data[c][r]))
}

/// Numeric label column as a vector
pub fn labels_to_array(labels: &Series) -> Result<Array1<f64>> {
    Ok(Array1::from_vec(series_to_f64(labels)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_to_array_row_major() {
        let df = df!(
            "a" => &[1i64, 2, 3],
            "b" => &[0.5, 1.5, 2.5],
            "c" => &[true, false, true]
        )
        .unwrap();

        let x = features_to_array(&df).unwrap();
        assert_eq!(x.dim(), (3, 3));
        assert_eq!(x[[1, 0]], 2.0);
        assert_eq!(x[[2, 1]], 2.5);
        assert_eq!(x[[1, 2]], 0.0);
    }

    #[test]
    fn test_string_column_rejected() {
        let df = df!("Pclass" => &[1i64, 3], "Sex" => &["male", "female"]).unwrap();
        let err = features_to_array(&df).unwrap_err();
        match err {
            PipelineError::TrainingError(msg) => assert!(msg.contains("Sex")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nulls_rejected() {
        let df = df!("Age" => &[Some(22.0), None, Some(38.0)]).unwrap();
        assert!(matches!(
            features_to_array(&df),
            Err(PipelineError::TrainingError(_))
        ));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let df = df!("Fare" => &[7.25, bad, 71.28]).unwrap();
            match features_to_array(&df) {
                Err(PipelineError::TrainingError(msg)) => assert!(msg.contains("Fare"), "{}", msg),
                other => panic!("expected TrainingError for {bad}, got {other:?}"),
            }
        }

        let df = df!("Fare" => &[f64::MAX, f64::MIN, 0.0]).unwrap();
        assert!(features_to_array(&df).is_ok());
    }

    #[test]
    fn test_labels_to_array() {
        let y = Series::new("Survived".into(), &[0i64, 1, 1]);
        assert_eq!(labels_to_array(&y).unwrap().to_vec(), vec![0.0, 1.0, 1.0]);
    }
}
