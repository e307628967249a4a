//! Data loading utilities

use crate::config::DataConfig;
use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// CSV loader for passenger tables
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned for schema inference
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    /// Loader configured from a [`DataConfig`]
    pub fn from_config(config: &DataConfig) -> Self {
        Self::new().with_infer_schema_length(config.infer_schema_length)
    }

    /// Set schema inference window (None scans the whole file)
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let file = File::open(path).map_err(|e| {
            PipelineError::DataError(format!("cannot open {}: {}", path.display(), e))
        })?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::DataError(format!("{}: {}", path.display(), e)))?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );

        Ok(df)
    }

    /// Load a CSV file and key its rows by `index_col`
    pub fn load_csv_indexed(&self, path: impl AsRef<Path>, index_col: &str) -> Result<Dataset> {
        let df = self.load_csv(path)?;
        Dataset::from_frame(df, index_col)
    }

    /// Load the training and test tables described by `config`
    pub fn load_train_test(&self, config: &DataConfig) -> Result<(Dataset, Dataset)> {
        let train = self.load_csv_indexed(&config.train_path, &config.index_col)?;
        let test = self.load_csv_indexed(&config.test_path, &config.index_col)?;

        info!(
            train_rows = train.height(),
            train_cols = train.width(),
            test_rows = test.height(),
            test_cols = test.width(),
            index = %config.index_col,
            "Loaded passenger tables"
        );

        Ok((train, test))
    }
}

/// Write datasets back to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV with the identifier as the first column
    pub fn save_csv(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut df = dataset.to_frame()?;
        let mut file = File::create(path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| PipelineError::DataError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = df.height(), "Saved CSV");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_passenger_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "PassengerId,Survived,Pclass,Name,Sex,Age").unwrap();
        writeln!(file, "1,0,3,\"Braund, Mr. Owen Harris\",male,22").unwrap();
        writeln!(file, "2,1,1,\"Cumings, Mrs. John Bradley\",female,38").unwrap();
        writeln!(file, "3,1,3,\"Heikkinen, Miss. Laina\",female,").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_passenger_csv();
        let df = DataLoader::new().load_csv(file.path()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 6);
    }

    #[test]
    fn test_load_csv_indexed() {
        let file = create_passenger_csv();
        let ds = DataLoader::new()
            .load_csv_indexed(file.path(), "PassengerId")
            .unwrap();

        assert_eq!(ds.height(), 3);
        assert_eq!(ds.width(), 5);
        assert_eq!(ds.index_name(), "PassengerId");
        let ids: Vec<Option<i64>> = ds.index().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        // Quoted names keep their commas
        assert_eq!(ds.column("Name").unwrap().str().unwrap().get(0), Some("Braund, Mr. Owen Harris"));
        assert_eq!(ds.column("Age").unwrap().null_count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = DataLoader::new().load_csv("/nonexistent/train.csv").unwrap_err();
        assert!(matches!(err, PipelineError::DataError(_)));
    }

    #[test]
    fn test_load_train_test() {
        let train = create_passenger_csv();
        let test = create_passenger_csv();
        let config = DataConfig::default()
            .with_train_path(train.path())
            .with_test_path(test.path());

        let (train_ds, test_ds) = DataLoader::from_config(&config)
            .load_train_test(&config)
            .unwrap();
        assert_eq!(train_ds.height(), 3);
        assert_eq!(test_ds.height(), 3);
    }

    #[test]
    fn test_save_csv() {
        let ds = Dataset::from_frame(
            df!("id" => &[5i64, 6], "prediction" => &[1i64, 0]).unwrap(),
            "id",
        )
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        DataSaver::save_csv(&ds, file.path()).unwrap();

        let loaded = DataLoader::new().load_csv_indexed(file.path(), "id").unwrap();
        assert_eq!(loaded, ds);
    }
}
