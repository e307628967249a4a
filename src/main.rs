//! Survival pipeline - data loading entry point
//!
//! Loads the training and test passenger tables from their fixed locations
//! and reports what was loaded.

use survival_pipeline::config::DataConfig;
use survival_pipeline::pipeline::RandomForestPipelineV1;
use survival_pipeline::utils::DataLoader;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survival_pipeline=info".into()),
        )
        .init();

    let config = DataConfig::default();
    let loader = DataLoader::from_config(&config);
    let (train, test) = loader.load_train_test(&config)?;

    info!(columns = ?train.column_names(), "Training table");
    info!(columns = ?test.column_names(), "Test table");

    let pipeline = RandomForestPipelineV1::random_forest_v1();
    info!(
        features = ?pipeline.feature_cols(),
        params = %pipeline.params().to_json()?,
        "Pipeline ready"
    );

    Ok(())
}
