use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use uplift_policy::models::{
    FeatureMatrix, ForestModel, LinearModel, ModelBundle, ModelError, ModelMetadata, ModelSpec,
    PredictiveModel, PreprocessSpec, RegressionTree, TreeNode,
};
use uplift_policy::scoring::{
    BestNDecision, ContactPolicy, InputError, ScoringError, ScoringRequest, ScoringService,
    ScoringSettings,
};
use uplift_policy::table::FeatureTable;

fn metadata() -> ModelMetadata {
    ModelMetadata {
        feature_cols: vec!["recency".into(), "channel".into()],
        cat_cols: vec!["channel".into()],
        id_fallback: "row_id".into(),
    }
}

fn preprocess() -> PreprocessSpec {
    let mut categories = BTreeMap::new();
    categories.insert("channel".to_string(), vec!["email".into(), "sms".into()]);
    PreprocessSpec { categories }
}

/// Treated arm: 0.1 * recency + 0.5 for email, 0.2 for sms. Control arm: flat 0.1.
fn service(settings: ScoringSettings) -> ScoringService<ModelSpec, ModelSpec> {
    let treated = ModelSpec::Linear(LinearModel {
        intercept: 0.0,
        coefficients: vec![0.1, 0.5, 0.2],
    });
    let control = ModelSpec::Linear(LinearModel {
        intercept: 0.1,
        coefficients: vec![0.0, 0.0, 0.0],
    });
    let bundle = ModelBundle::new(metadata(), &preprocess(), treated, control).expect("bundle");
    ScoringService::from_bundle(bundle, settings)
}

fn table(csv: &str) -> FeatureTable {
    FeatureTable::from_reader(Cursor::new(csv)).expect("table parses")
}

#[test]
fn scores_a_table_end_to_end() {
    let service = service(ScoringSettings::default());
    let table = table("customer_id,recency,channel\nA,1,email\nB,2,sms\nC,0,push\n");
    let request = ScoringRequest::new(1.0, 0.25, ContactPolicy::Threshold)
        .with_id_column(Some("customer_id".into()));

    let outcome = service.score_table(&table, &request).expect("scores");

    // Uplifts: A = 0.1 + 0.5 - 0.1 = 0.5, B = 0.2 + 0.2 - 0.1 = 0.3, C = -0.1.
    let ids: Vec<&str> = outcome
        .selection
        .records
        .iter()
        .map(|r| r.row_id.as_str())
        .collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(outcome.summary.contacts, 2);
    assert_eq!(outcome.scored, 3);
    assert!(outcome.rejected.is_empty());
}

#[test]
fn synthesizes_identifiers_when_no_column_matches() {
    let service = service(ScoringSettings::default());
    let table = table("recency,channel\n1,email\n9,sms\n");
    let request = ScoringRequest::new(1.0, 0.0, ContactPolicy::BestN)
        .with_id_column(Some("member".into()));

    let outcome = service.score_table(&table, &request).expect("scores");
    let ids: Vec<&str> = outcome
        .selection
        .records
        .iter()
        .map(|r| r.row_id.as_str())
        .collect();
    assert_eq!(ids, vec!["1", "0"]);
    assert_eq!(
        outcome.selection.decision,
        Some(BestNDecision::Optimized {
            n: 2,
            profit: outcome.summary.expected_profit
        })
    );
}

#[test]
fn missing_feature_columns_fail_before_prediction() {
    let service = service(ScoringSettings::default());
    let table = table("customer_id,recency\nA,1\n");
    let request = ScoringRequest::new(1.0, 0.3, ContactPolicy::Threshold);

    match service.score_table(&table, &request) {
        Err(ScoringError::Input(InputError::MissingColumns(columns))) => {
            assert_eq!(columns, vec!["channel"]);
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
}

#[test]
fn rows_with_missing_numbers_are_excluded_within_tolerance() {
    let service = service(ScoringSettings {
        max_invalid_fraction: 0.5,
        allow_empty_best_n: false,
    });
    let table = table("row_id,recency,channel\nr1,,email\nr2,3,email\nr3,2,sms\n");
    let request = ScoringRequest::new(1.0, 0.0, ContactPolicy::BestN).with_top_n(Some(10));

    let outcome = service.score_table(&table, &request).expect("scores");
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].id.as_str(), "r1");
    assert_eq!(outcome.rejected[0].row, 0);
    assert_eq!(outcome.selection.len(), 2);
    assert_eq!(
        outcome.selection.decision,
        Some(BestNDecision::Override {
            requested: 10,
            applied: 2
        })
    );
}

#[test]
fn too_many_missing_rows_abort_the_batch() {
    let service = service(ScoringSettings::default());
    let table = table("row_id,recency,channel\nr1,,email\nr2,3,email\n");
    let request = ScoringRequest::new(1.0, 0.0, ContactPolicy::BestN);

    let error = service
        .score_table(&table, &request)
        .expect_err("half the rows are invalid");
    assert!(matches!(
        error,
        ScoringError::Input(InputError::TooManyInvalidPredictions {
            rejected: 1,
            total: 2,
            ..
        })
    ));
}

#[test]
fn header_only_table_yields_empty_outcome() {
    let service = service(ScoringSettings::default());
    let table = table("recency,channel\n");
    let request = ScoringRequest::new(1.0, 0.0, ContactPolicy::BestN);

    let outcome = service.score_table(&table, &request).expect("scores");
    assert!(outcome.selection.is_empty());
    assert_eq!(outcome.selection.decision, Some(BestNDecision::Empty));
    assert_eq!(outcome.summary.expected_profit, 0.0);
}

struct Failing;

impl PredictiveModel for Failing {
    fn predict(&self, _features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Inference("backend offline".into()))
    }
}

struct Constant(f64);

impl PredictiveModel for Constant {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.0; features.rows()])
    }
}

#[test]
fn model_failures_abort_without_partial_output() {
    let meta = metadata();
    let encoder = uplift_policy::models::FeatureEncoder::new(&meta, &preprocess());
    let service = ScoringService::new(
        meta,
        encoder,
        Arc::new(Constant(1.0)),
        Arc::new(Failing),
        ScoringSettings::default(),
    );
    let table = table("recency,channel\n1,email\n");
    let request = ScoringRequest::new(1.0, 0.0, ContactPolicy::Threshold);

    let error = service
        .score_table(&table, &request)
        .expect_err("control arm fails");
    assert!(matches!(error, ScoringError::Model(ModelError::Inference(_))));
}

#[test]
fn unvalidated_forest_surfaces_a_model_error() {
    let meta = metadata();
    let encoder = uplift_policy::models::FeatureEncoder::new(&meta, &preprocess());
    let forest = ModelSpec::Forest(ForestModel {
        trees: vec![RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 9,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: 0.4 },
                TreeNode::Leaf { value: 0.6 },
            ],
        }],
    });
    let service = ScoringService::new(
        meta,
        encoder,
        Arc::new(forest),
        Arc::new(Constant(0.1)),
        ScoringSettings::default(),
    );
    let table = table("recency,channel\n1,email\n");
    let request = ScoringRequest::new(1.0, 0.0, ContactPolicy::BestN);

    match service.score_table(&table, &request) {
        Err(ScoringError::Model(ModelError::InvalidTree { tree: 0, node: 0, .. })) => {}
        other => panic!("expected invalid tree, got {other:?}"),
    }
}

#[test]
fn explicit_services_share_models_across_threads() {
    let service = Arc::new(service(ScoringSettings::default()));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let csv = format!("row_id,recency,channel\nw{worker},{worker},sms\n");
                let table = FeatureTable::from_reader(Cursor::new(csv)).expect("table");
                let request = ScoringRequest::new(1.0, 0.0, ContactPolicy::BestN);
                service
                    .score_table(&table, &request)
                    .expect("scores")
                    .summary
                    .contacts
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("worker finishes"), 1);
    }
}

#[test]
fn shipped_sample_bundle_scores_the_demo_campaign() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let bundle = ModelBundle::load(root.join("models")).expect("sample bundle loads");
    assert_eq!(bundle.encoder.width(), 6);

    let service = ScoringService::from_bundle(bundle, ScoringSettings::default());
    let table = FeatureTable::from_path(root.join("demos/customers.csv")).expect("demo table");
    let request = ScoringRequest::new(0.30, 0.0, ContactPolicy::BestN);

    let outcome = service.score_table(&table, &request).expect("scores");
    assert_eq!(outcome.scored, 10);
    assert!(outcome.rejected.is_empty());
    assert!(outcome
        .selection
        .records
        .iter()
        .all(|record| record.row_id.as_str().starts_with("C-")));
    for pair in outcome.selection.records.windows(2) {
        assert!(pair[0].uplift_hat >= pair[1].uplift_hat);
    }
}
