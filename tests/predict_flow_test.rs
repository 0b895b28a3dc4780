use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use rateware::api;
use rateware::config::DEFAULT_FORM_LIMIT;
use rateware::db::Database;
use rateware::oracle::{ArtifactOracle, ModelVariant, OracleError, OracleOutput, PredictionOracle};

// Oracle double that replays a fixed answer and records how it was called
struct StubOracle {
    answer: Option<OracleOutput>,
    calls: AtomicUsize,
    last_call: Mutex<Option<(String, ModelVariant)>>,
}

impl StubOracle {
    fn answering(output: OracleOutput) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(output),
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionOracle for StubOracle {
    async fn predict(&self, text: &str, variant: ModelVariant) -> Result<OracleOutput, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some((text.to_string(), variant));
        self.answer
            .clone()
            .ok_or_else(|| OracleError::MalformedOutput("unsupported input".into()))
    }
}

async fn test_db() -> Database {
    let db = Database::new(":memory:").unwrap();
    db.create_schema().await.unwrap();
    db
}

macro_rules! init_app {
    ($db:expr, $oracle:expr) => {{
        let oracle: Arc<dyn PredictionOracle> = $oracle.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.clone()))
                .app_data(web::Data::from(oracle))
                .configure(api::configure(DEFAULT_FORM_LIMIT)),
        )
        .await
    }};
}

fn stored_reviews(path: &str) -> Vec<(String, String, i64, String)> {
    let conn = rusqlite::Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT text, pred_sentiment, pred_rating, model FROM reviews ORDER BY id")
        .unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn temp_db_path() -> String {
    std::env::temp_dir()
        .join(format!("rateware-test-{}.db", uuid::Uuid::new_v4()))
        .display()
        .to_string()
}

#[actix_web::test]
async fn get_renders_empty_form_without_writing() {
    let db = test_db().await;
    let oracle = StubOracle::answering(OracleOutput::Scalar {
        sentiment: vec![1],
        rating: vec![5],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("data-sentiment=\"\""));
    assert!(html.contains("data-rating=\"\""));

    assert_eq!(oracle.calls(), 0);
    assert_eq!(db.count_reviews().await.unwrap(), 0);
}

#[actix_web::test]
async fn tf_idf_submission_uses_scalar_rating() {
    let path = temp_db_path();
    let db = Database::new(&path).unwrap();
    db.create_schema().await.unwrap();
    let oracle = StubOracle::answering(OracleOutput::Scalar {
        sentiment: vec![1],
        rating: vec![5],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", "Great product!"), ("model", "tf-idf")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("data-sentiment=\"positive\""));
    assert!(html.contains("data-rating=\"5\""));

    assert_eq!(
        *oracle.last_call.lock().unwrap(),
        Some(("Great product!".to_string(), ModelVariant::TfIdf))
    );
    assert_eq!(
        stored_reviews(&path),
        vec![(
            "Great product!".to_string(),
            "positive".to_string(),
            5,
            "tf-idf".to_string()
        )]
    );

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn alternate_submission_unwraps_nested_rating() {
    let path = temp_db_path();
    let db = Database::new(&path).unwrap();
    db.create_schema().await.unwrap();
    let oracle = StubOracle::answering(OracleOutput::Nested {
        sentiment: vec![0],
        rating: vec![vec![2]],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", "Terrible."), ("model", "bow")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("data-sentiment=\"negative\""));
    assert!(html.contains("data-rating=\"2\""));

    // The stored model is the raw flag, not a normalised variant name
    assert_eq!(
        stored_reviews(&path),
        vec![(
            "Terrible.".to_string(),
            "negative".to_string(),
            2,
            "bow".to_string()
        )]
    );

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn unknown_model_flag_falls_back_to_alternate() {
    let db = test_db().await;
    let oracle = StubOracle::answering(OracleOutput::Nested {
        sentiment: vec![1],
        rating: vec![vec![8]],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", "Solid."), ("model", "word2vec")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let last_call = oracle.last_call.lock().unwrap().clone();
    assert_eq!(last_call.map(|(_, v)| v), Some(ModelVariant::Alternate));
    assert_eq!(db.count_reviews().await.unwrap(), 1);
}

#[actix_web::test]
async fn missing_text_is_rejected_before_oracle() {
    let db = test_db().await;
    let oracle = StubOracle::answering(OracleOutput::Scalar {
        sentiment: vec![1],
        rating: vec![5],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("model", "tf-idf")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(oracle.calls(), 0);
    assert_eq!(db.count_reviews().await.unwrap(), 0);
}

#[actix_web::test]
async fn missing_model_is_rejected() {
    let db = test_db().await;
    let oracle = StubOracle::answering(OracleOutput::Scalar {
        sentiment: vec![1],
        rating: vec![5],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", "Great product!")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(oracle.calls(), 0);
    assert_eq!(db.count_reviews().await.unwrap(), 0);
}

#[actix_web::test]
async fn oracle_failure_is_a_server_error_and_stores_nothing() {
    let db = test_db().await;
    let oracle = StubOracle::failing();
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", "Great product!"), ("model", "tf-idf")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(oracle.calls(), 1);
    assert_eq!(db.count_reviews().await.unwrap(), 0);
}

#[actix_web::test]
async fn mismatched_oracle_shape_is_a_server_error() {
    let db = test_db().await;
    let oracle = StubOracle::answering(OracleOutput::Nested {
        sentiment: vec![1],
        rating: vec![vec![5]],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", "Great product!"), ("model", "tf-idf")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(db.count_reviews().await.unwrap(), 0);
}

#[actix_web::test]
async fn storage_failure_hides_prediction() {
    // No schema, so the insert fails
    let db = Database::new(":memory:").unwrap();
    let oracle = StubOracle::answering(OracleOutput::Scalar {
        sentiment: vec![1],
        rating: vec![5],
    });
    let app = init_app!(db, oracle);

    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", "Great product!"), ("model", "tf-idf")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(!body.contains("positive"));
}

#[actix_web::test]
async fn each_submission_adds_exactly_one_record() {
    let db = test_db().await;
    let oracle = StubOracle::answering(OracleOutput::Scalar {
        sentiment: vec![0],
        rating: vec![3],
    });
    let app = init_app!(db, oracle);

    for i in 1..=3 {
        let req = test::TestRequest::post()
            .uri("/")
            .set_form(vec![("text", "Meh."), ("model", "tf-idf")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(db.count_reviews().await.unwrap(), i);

        let req = test::TestRequest::get().uri("/").to_request();
        test::call_service(&app, req).await;
        assert_eq!(db.count_reviews().await.unwrap(), i);
    }
}

#[actix_web::test]
async fn bundled_artifact_serves_both_variants() {
    let db = test_db().await;
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/predict.json");
    let oracle = Arc::new(ArtifactOracle::load(path).unwrap());
    let app = init_app!(db, oracle);

    for model in ["tf-idf", "bow"] {
        let req = test::TestRequest::post()
            .uri("/")
            .set_form(vec![("text", "Great acting, wonderful story. Loved it!"), ("model", model)])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains("data-sentiment=\"positive\""));
    }
    assert_eq!(db.count_reviews().await.unwrap(), 2);
}

#[actix_web::test]
async fn long_review_is_accepted() {
    let path = temp_db_path();
    let db = Database::new(&path).unwrap();
    db.create_schema().await.unwrap();
    let path_to_artifact = concat!(env!("CARGO_MANIFEST_DIR"), "/data/predict.json");
    let oracle = Arc::new(ArtifactOracle::load(path_to_artifact).unwrap());
    let app = init_app!(db, oracle);

    // Well past actix's 16 KiB form default
    let text = "great ".repeat(100_000 / 6);
    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", text.as_str()), ("model", "tf-idf")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = stored_reviews(&path);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, text);
    assert_eq!(stored[0].1, "positive");

    let _ = std::fs::remove_file(&path);
}

#[actix_web::test]
async fn form_limit_is_configurable() {
    let db = test_db().await;
    let oracle: Arc<dyn PredictionOracle> = StubOracle::answering(OracleOutput::Scalar {
        sentiment: vec![1],
        rating: vec![5],
    });
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::from(oracle))
            .configure(api::configure(1024)),
    )
    .await;

    let text = "a".repeat(4096);
    let req = test::TestRequest::post()
        .uri("/")
        .set_form(vec![("text", text.as_str()), ("model", "tf-idf")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(db.count_reviews().await.unwrap(), 0);
}
