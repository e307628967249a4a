use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use survival_pipeline::prelude::*;

fn create_classification_data(n_rows: usize, n_features: usize) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let features: Vec<Vec<f64>> = (0..n_features)
        .map(|_| (0..n_rows).map(|_| rng.gen::<f64>() * 10.0).collect())
        .collect();

    // Label: sum of first two features above the midpoint
    let label: Vec<i64> = (0..n_rows)
        .map(|i| (features[0][i] + features.get(1).map_or(0.0, |f| f[i]) > 10.0) as i64)
        .collect();

    let mut columns: Vec<Column> = features
        .into_iter()
        .enumerate()
        .map(|(i, values)| Column::new(format!("feature_{}", i).into(), values))
        .collect();
    columns.push(Column::new("label".into(), label));
    columns.push(Column::new("id".into(), (0..n_rows as i64).collect::<Vec<_>>()));

    Dataset::from_frame(DataFrame::new(columns).unwrap(), "id").unwrap()
}

fn feature_names(n_features: usize) -> Vec<String> {
    (0..n_features).map(|i| format!("feature_{}", i)).collect()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [500, 2000, 5000].iter() {
        let data = create_classification_data(*n_rows, 8);
        let pipeline = GeneralPipeline::<RandomForestClassifier>::new(feature_names(8))
            .with_param("n_estimators", 50)
            .with_param("max_depth", 6)
            .with_param("random_state", 42)
            .with_param("n_jobs", -1);

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &data, |b, data| {
            b.iter(|| pipeline.fit(black_box(data), "label").unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train once, predict many
    let train = create_classification_data(2000, 8);
    let fitted = RandomForestPipelineV1::with_params(
        feature_names(8),
        survival_pipeline::pipeline::random_forest_v1_params(),
    )
    .fit(&train, "label")
    .unwrap();

    for n_rows in [100, 1000, 5000].iter() {
        let data = create_classification_data(*n_rows, 8);
        group.bench_with_input(BenchmarkId::new("predict", n_rows), &data, |b, data| {
            b.iter(|| fitted.predict(black_box(data)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
