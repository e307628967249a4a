//! Data location configuration

use std::path::{Path, PathBuf};

/// Default training file, relative to the working directory
pub const TRAIN_DATA_PATH: &str = "data/train.csv";
/// Default test file, relative to the working directory
pub const TEST_DATA_PATH: &str = "data/test.csv";
/// Passenger identifier column used as the row index
pub const INDEX_COL: &str = "PassengerId";
/// Survival label, present in the training file only
pub const TARGET_COL: &str = "Survived";

/// Where the passenger tables live and how they are keyed
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    /// Training table (with label column)
    pub train_path: PathBuf,
    /// Test table (without label column)
    pub test_path: PathBuf,
    /// Identifier column
    pub index_col: String,
    /// Label column in the training table
    pub target_col: String,
    /// Rows scanned for schema inference (None = full file)
    pub infer_schema_length: Option<usize>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from(TRAIN_DATA_PATH),
            test_path: PathBuf::from(TEST_DATA_PATH),
            index_col: INDEX_COL.to_string(),
            target_col: TARGET_COL.to_string(),
            infer_schema_length: Some(100),
        }
    }
}

impl DataConfig {
    /// Set the training file path
    pub fn with_train_path(mut self, path: impl AsRef<Path>) -> Self {
        self.train_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the test file path
    pub fn with_test_path(mut self, path: impl AsRef<Path>) -> Self {
        self.test_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the identifier column
    pub fn with_index_col(mut self, col: impl Into<String>) -> Self {
        self.index_col = col.into();
        self
    }

    /// Set the label column
    pub fn with_target_col(mut self, col: impl Into<String>) -> Self {
        self.target_col = col.into();
        self
    }

    /// Set the schema inference window
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_literals() {
        let config = DataConfig::default();
        assert_eq!(config.train_path, PathBuf::from("data/train.csv"));
        assert_eq!(config.test_path, PathBuf::from("data/test.csv"));
        assert_eq!(config.index_col, "PassengerId");
        assert_eq!(config.target_col, "Survived");
    }

    #[test]
    fn test_builder() {
        let config = DataConfig::default()
            .with_train_path("/tmp/a.csv")
            .with_index_col("id")
            .with_infer_schema_length(None);
        assert_eq!(config.train_path, PathBuf::from("/tmp/a.csv"));
        assert_eq!(config.index_col, "id");
        assert_eq!(config.infer_schema_length, None);
        assert_eq!(config.test_path, PathBuf::from(TEST_DATA_PATH));
    }
}
