use expression_pca::{
    AnalysisConfig, AnalysisPipeline, CellValue, ErrorCategory, Orientation, PcaError,
    ProjectionMode, RawRecord, RawTable,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn rows_pipeline() -> AnalysisPipeline {
    let config = AnalysisConfig::default().with_orientation(Orientation::SamplesAsRows);
    AnalysisPipeline::new(config).unwrap()
}

fn random_table(n_rows: usize, n_cols: usize, seed: u64) -> RawTable {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let records = (0..n_rows)
        .map(|i| {
            let mut record = RawRecord::new().with("id", format!("r{}", i));
            for j in 0..n_cols {
                // column j is scaled so the spectrum is not flat
                let value: f64 = noise.sample(&mut rng) * (j + 1) as f64;
                record.insert(format!("c{}", j), value);
            }
            record
        })
        .collect();
    RawTable::new(records)
}

#[test]
fn four_samples_three_features_end_to_end() {
    let table = RawTable::from_json_str(
        r#"[
            {"sample": "A", "gene_z": 2.0, "gene_a": "1,5", "gene_m": 7.0},
            {"sample": "B", "gene_z": 2.0, "gene_a": 3.0, "gene_m": 1.0},
            {"sample": "C", "gene_z": 2.0, "gene_a": 4.25, "gene_m": 0.5},
            {"sample": "D", "gene_z": 2.0, "gene_a": " 0,75 ", "gene_m": 6.0}
        ]"#,
    )
    .unwrap();

    let analysis = rows_pipeline().analyze(&table, None).unwrap();

    assert!(analysis.cleaned.dropped_rows.is_empty());
    let matrix = &analysis.cleaned.matrix;
    assert_eq!(matrix.n_rows(), 4);
    assert_eq!(matrix.column_names(), &["gene_z", "gene_a", "gene_m"]);
    assert_eq!(matrix.values()[[0, 1]], 1.5);
    assert_eq!(matrix.values()[[3, 1]], 0.75);

    let z = &analysis.standardized;
    assert_eq!(z.constant_features(), vec![0]);
    assert!(z.values().column(0).iter().all(|v| *v == 0.0));

    let pca = &analysis.pca;
    assert!(pca.n_components() <= 3);
    let ratio_sum: f64 = pca.explained_variance_ratio().sum();
    assert!((ratio_sum - 1.0).abs() < 1e-9);

    // the constant feature carries no weight on any component that explains variance
    for (c, ev) in pca.explained_variance().iter().enumerate() {
        if *ev > 1e-9 {
            assert!(pca.loadings()[[c, 0]].abs() < 1e-9);
        }
    }
}

#[test]
fn one_sample_is_insufficient() {
    let table = RawTable::new(vec![RawRecord::new()
        .with("id", "only")
        .with("x", 1.0)
        .with("y", 2.0)]);
    let err = rows_pipeline().run(&table, ProjectionMode::Scree).unwrap_err();
    assert!(matches!(err, PcaError::InsufficientData(_)));
    assert_eq!(err.category(), ErrorCategory::NotEnoughData);

    // one condition column read as samples
    let columns = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let table = RawTable::new(vec![
        RawRecord::new().with("gene", "g1").with("cond", 1.0),
        RawRecord::new().with("gene", "g2").with("cond", 4.0),
    ]);
    assert!(matches!(
        columns.analyze(&table, None),
        Err(PcaError::InsufficientData(_))
    ));
}

#[test]
fn incomplete_rows_are_dropped_whole() {
    let table = RawTable::new(vec![
        RawRecord::new().with("id", "keep1").with("a", 1.0).with("b", 2.0),
        RawRecord::new().with("id", "null").with("a", CellValue::Missing).with("b", 2.0),
        RawRecord::new().with("id", "keep2").with("a", "3,0").with("b", 5.0),
        RawRecord::new().with("id", "text").with("a", 1.0).with("b", "n/a"),
        RawRecord::new().with("id", "nan").with("a", "NaN").with("b", 1.0),
        RawRecord::new().with("id", "keep3").with("a", 0.5).with("b", 0.0),
    ]);
    let analysis = rows_pipeline().analyze(&table, None).unwrap();

    assert_eq!(analysis.cleaned.dropped_rows, vec!["null", "text", "nan"]);
    assert_eq!(
        analysis.cleaned.matrix.row_labels(),
        &["keep1", "keep2", "keep3"]
    );
    assert_eq!(analysis.pca.sample_labels(), &["keep1", "keep2", "keep3"]);
}

#[test]
fn nothing_left_after_cleaning() {
    let table = RawTable::new(vec![
        RawRecord::new().with("id", "a").with("x", "").with("y", 1.0),
        RawRecord::new().with("id", "b").with("x", 2.0).with("y", CellValue::Missing),
    ]);
    let err = rows_pipeline().run(&table, ProjectionMode::Scatter).unwrap_err();
    assert!(matches!(err, PcaError::EmptyDataset(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn inconsistent_records_are_malformed() {
    let table = RawTable::new(vec![
        RawRecord::new().with("id", "a").with("x", 1.0).with("y", 2.0),
        RawRecord::new().with("id", "b").with("x", 2.0).with("w", 3.0),
    ]);
    let err = rows_pipeline().run(&table, ProjectionMode::Scree).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::BadInput);
}

#[test]
fn repeated_runs_are_identical() {
    let table = random_table(12, 5, 7);
    let pipeline = rows_pipeline();
    for mode in [
        ProjectionMode::Scatter,
        ProjectionMode::Scree,
        ProjectionMode::Loadings,
    ] {
        let first = pipeline.run(&table, mode).unwrap();
        let second = pipeline.run(&table, mode).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

#[test]
fn explained_variance_is_ordered_and_bounded() {
    // tall, square and wide inputs exercise both decomposition routes
    for (seed, (n, p)) in [(20, 4), (6, 6), (5, 11), (3, 30)].into_iter().enumerate() {
        let table = random_table(n, p, seed as u64);
        let pipeline = rows_pipeline();

        let full = pipeline.analyze(&table, None).unwrap().pca;
        let ratios = full.explained_variance_ratio();
        assert_eq!(ratios.len(), n.min(p));
        for i in 0..ratios.len() {
            assert!((0.0..=1.0).contains(&ratios[i]));
            if i > 0 {
                assert!(ratios[i] <= ratios[i - 1] + 1e-12);
            }
        }
        assert!((ratios.sum() - 1.0).abs() < 1e-9, "{}x{}", n, p);

        let partial = pipeline.analyze(&table, Some(2)).unwrap().pca;
        assert_eq!(partial.n_components(), 2);
        assert!(partial.explained_variance_ratio().sum() <= 1.0 + 1e-12);
        for c in 0..2 {
            assert!((partial.explained_variance_ratio()[c] - ratios[c]).abs() < 1e-9);
        }
    }
}

#[test]
fn scatter_artifact_shape() {
    let table = random_table(3, 6, 42);
    let config = AnalysisConfig::default();
    let artifact = AnalysisPipeline::new(config)
        .unwrap()
        .run(&table, ProjectionMode::Scatter)
        .unwrap();
    let value = serde_json::to_value(&artifact).unwrap();

    // columns are samples by default: six traces
    let data = value["data"].as_array().unwrap();
    assert_eq!(data.len(), 6);
    assert_eq!(data[0]["type"], "scatter");
    assert_eq!(data[0]["mode"], "markers");
    assert_eq!(data[0]["name"], "c0");
    assert_eq!(data[0]["marker"]["color"], "#fa8072");

    let x_title = value["layout"]["xaxis"]["title"].as_str().unwrap();
    assert!(x_title.starts_with("PC1 (") && x_title.ends_with("%)"));
    assert_eq!(value["layout"]["title"]["text"], "PCA Plot");
    assert_eq!(value["layout"]["showlegend"], true);
}

#[test]
fn scatter_needs_two_components() {
    let config = AnalysisConfig::default()
        .with_orientation(Orientation::SamplesAsRows)
        .with_scatter_components(Some(1));
    let table = random_table(5, 3, 1);
    let err = AnalysisPipeline::new(config)
        .unwrap()
        .run(&table, ProjectionMode::Scatter)
        .unwrap_err();
    assert!(matches!(err, PcaError::InsufficientData(_)));
}

#[test]
fn scree_is_capped_and_cumulative_ends_near_100() {
    let table = random_table(30, 12, 3);
    let artifact = rows_pipeline().run(&table, ProjectionMode::Scree).unwrap();
    let value = serde_json::to_value(&artifact).unwrap();

    let bars = value["data"][0]["y"].as_array().unwrap();
    assert_eq!(bars.len(), 8);
    let cumulative = value["data"][1]["y"].as_array().unwrap();
    let last = cumulative.last().unwrap().as_f64().unwrap();
    assert!(last <= 100.0 + 0.05 * 8.0);
    assert_eq!(value["data"][0]["text"][0].as_str().unwrap().chars().last(), Some('%'));
}

#[test]
fn delimited_input_runs_through_pipeline() {
    let text = "sample;g1;g2;g3\n\
                s1;1,5;2;9\n\
                s2;2,5;;1\n\
                s3;0,25;4;3\n\
                s4;3;1;7\n";
    let table = RawTable::from_csv_reader(text.as_bytes(), b';').unwrap();
    let analysis = rows_pipeline().analyze(&table, None).unwrap();
    assert_eq!(analysis.cleaned.dropped_rows, vec!["s2"]);
    assert_eq!(analysis.cleaned.matrix.values()[[1, 0]], 0.25);
    assert_eq!(analysis.pca.n_components(), 3);
}

#[test]
fn scatter_values_follow_the_fit() {
    let table = random_table(9, 4, 11);
    let pipeline = rows_pipeline();
    let pca = pipeline.analyze(&table, None).unwrap().pca;
    let artifact = pipeline.run(&table, ProjectionMode::Scatter).unwrap();
    let value = serde_json::to_value(&artifact).unwrap();

    let traces = value["data"].as_array().unwrap();
    assert_eq!(traces.len(), 9);
    for (i, trace) in traces.iter().enumerate() {
        assert_eq!(trace["name"], format!("r{}", i));
        assert_eq!(trace["x"][0].as_f64().unwrap(), pca.scores()[[i, 0]]);
        assert_eq!(trace["y"][0].as_f64().unwrap(), pca.scores()[[i, 1]]);
    }

    let ratios = pca.explained_variance_ratio();
    assert_eq!(
        value["layout"]["xaxis"]["title"],
        format!("PC1 ({:.2}%)", ratios[0] * 100.0)
    );
    assert_eq!(
        value["layout"]["yaxis"]["title"],
        format!("PC2 ({:.2}%)", ratios[1] * 100.0)
    );
}

#[test]
fn loadings_values_follow_the_fit() {
    let table = random_table(10, 5, 12);
    let pipeline = rows_pipeline();
    let pca = pipeline.analyze(&table, Some(2)).unwrap().pca;
    let artifact = pipeline.run(&table, ProjectionMode::Loadings).unwrap();
    let value = serde_json::to_value(&artifact).unwrap();

    let series = value["data"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    for (i, bar) in series.iter().enumerate() {
        assert_eq!(bar["name"], format!("PC{}", i + 1));
        for (j, feature) in pca.feature_labels().iter().enumerate() {
            assert_eq!(bar["x"][j], feature.as_str());
            assert_eq!(bar["y"][j].as_f64().unwrap(), pca.loadings()[[i, j]]);
        }
    }
}

#[test]
fn scree_text_is_rounded_height() {
    let table = random_table(15, 6, 13);
    let artifact = rows_pipeline().run(&table, ProjectionMode::Scree).unwrap();
    let value = serde_json::to_value(&artifact).unwrap();
    let bars = &value["data"][0];
    for (c, height) in bars["y"].as_array().unwrap().iter().enumerate() {
        assert_eq!(bars["text"][c], format!("{:.1}%", height.as_f64().unwrap()));
    }
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn one_pipeline_serves_concurrent_requests() {
    assert_send_sync::<AnalysisPipeline>();
    assert_send_sync::<RawTable>();
    assert_send_sync::<expression_pca::PlotArtifact>();

    let pipeline = rows_pipeline();
    let tables = [random_table(8, 3, 21), random_table(6, 7, 22)];
    let expected: Vec<_> = tables
        .iter()
        .map(|t| pipeline.run(t, ProjectionMode::Scree).unwrap())
        .collect();

    let shared = &pipeline;
    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = tables
            .iter()
            .map(|t| scope.spawn(move || shared.run(t, ProjectionMode::Scree)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect()
    });
    assert_eq!(concurrent, expected);
}
