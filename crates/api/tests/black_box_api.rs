use std::sync::Arc;

use chrono::{Duration, Utc};
use pricelab_api::app::services::AppStore;
use pricelab_storage::JsonFileStore;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, JSON backend in a throwaway directory,
        // bound to an ephemeral port.
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = JsonFileStore::open(dir.path().join("data.json"))
            .expect("failed to open json store");
        let app = pricelab_api::app::build_app(AppStore::Json(Arc::new(store)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}/api");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle, _dir: dir }
    }

    fn root_url(&self) -> String {
        self.base_url.trim_end_matches("/api").to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_process(client: &reqwest::Client, base: &str) -> Value {
    let res = client
        .post(format!("{base}/processes"))
        .json(&json!({"process_number": "015/2026", "object": "office furniture"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn create_item(client: &reqwest::Client, base: &str, process_id: &str) -> Value {
    let res = client
        .post(format!("{base}/processes/{process_id}/items"))
        .json(&json!({
            "specification": "office chair, ergonomic",
            "unit": "unit",
            "quantity": 10.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.root_url())).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn process_crud_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_process(&client, &srv.base_url).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["process_number"], "015/2026");

    let res = client
        .get(format!("{}/processes", srv.base_url))
        .send()
        .await
        .unwrap();
    let listed: Vec<Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);

    let res = client
        .put(format!("{}/processes/{id}", srv.base_url))
        .json(&json!({"process_number": "015-A/2026", "object": "office furniture"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["process_number"], "015-A/2026");

    let res = client
        .delete(format!("{}/processes/{id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/processes/{id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_and_id_errors_map_to_400() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Blank process number fails validation.
    let res = client
        .post(format!("{}/processes", srv.base_url))
        .json(&json!({"process_number": "  ", "object": "anything"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    // Malformed uuid in the path.
    let res = client
        .get(format!("{}/processes/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn quotes_carry_expiry_and_age() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap();
    let item = create_item(&client, &srv.base_url, process_id).await;
    let item_id = item["id"].as_str().unwrap();

    // Fresh private quote: valid.
    let recent = (Utc::now().date_naive() - Duration::days(10)).format("%Y-%m-%d");
    let res = client
        .post(format!("{}/items/{item_id}/quotes", srv.base_url))
        .json(&json!({
            "source": "Furniture Co",
            "quote_date": recent.to_string(),
            "unit_price": 199.9,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let fresh: Value = res.json().await.unwrap();
    assert_eq!(fresh["is_expired"], false);
    assert_eq!(fresh["age"], "valid");

    // A 200-day-old private quote is past its 180-day window.
    let stale = (Utc::now().date_naive() - Duration::days(200)).format("%Y-%m-%d");
    let res = client
        .post(format!("{}/items/{item_id}/quotes", srv.base_url))
        .json(&json!({
            "source": "Old Supplier",
            "quote_date": stale.to_string(),
            "unit_price": 150.0,
        }))
        .send()
        .await
        .unwrap();
    let expired: Value = res.json().await.unwrap();
    assert_eq!(expired["is_expired"], true);
    assert_eq!(expired["age"], "expired");

    // The same date as a public quote (360-day window) is still valid.
    let res = client
        .post(format!("{}/items/{item_id}/quotes", srv.base_url))
        .json(&json!({
            "source": "Gov Catalog",
            "quote_date": stale.to_string(),
            "unit_price": 160.0,
            "quote_type": "public",
        }))
        .send()
        .await
        .unwrap();
    let public: Value = res.json().await.unwrap();
    assert_eq!(public["is_expired"], false);
}

#[tokio::test]
async fn deleting_a_process_cascades_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap().to_string();
    let item = create_item(&client, &srv.base_url, &process_id).await;
    let item_id = item["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/items/{item_id}/quotes", srv.base_url))
        .json(&json!({
            "source": "Furniture Co",
            "quote_date": "2026-08-01",
            "unit_price": 120.0,
        }))
        .send()
        .await
        .unwrap();

    let res = client
        .delete(format!("{}/processes/{process_id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/items/{item_id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/history", srv.base_url))
        .send()
        .await
        .unwrap();
    let history: Vec<Value> = res.json().await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn batch_item_import_assigns_numbers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap();

    // First column is an explicit number on line 1 only.
    let text = "1;Resma de papel A4;pacote;120\nCaneta esferográfica azul;caixa;35,5\n";
    let res = client
        .post(format!("{}/processes/{process_id}/items/batch", srv.base_url))
        .json(&json!({"text": text}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Vec<Value> = res.json().await.unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["item_number"], 1);
    assert_eq!(created[1]["item_number"], 2);
    assert_eq!(created[1]["quantity"], 35.5);
}

#[tokio::test]
async fn batch_quote_import_parses_brazilian_formats() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap();
    let item = create_item(&client, &srv.base_url, process_id).await;
    let item_id = item["id"].as_str().unwrap();

    let text = "Papelaria Central;12 de março de 2026;R$ 1.234,56\n\
                Distribuidora Sul;05/04/2026;987,60;público\n";
    let res = client
        .post(format!("{}/items/{item_id}/quotes/batch", srv.base_url))
        .json(&json!({"text": text}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Vec<Value> = res.json().await.unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0]["unit_price"], 1234.56);
    assert_eq!(created[0]["quote_date"], "2026-03-12");
    assert_eq!(created[1]["quote_type"], "public");
}

#[tokio::test]
async fn bad_import_rows_are_reported_per_line() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap();
    let item = create_item(&client, &srv.base_url, process_id).await;
    let item_id = item["id"].as_str().unwrap();

    let text = "Fornecedor A;10/01/2026;10,00\nFornecedor B;not-a-date;12,00\n";
    let res = client
        .post(format!("{}/items/{item_id}/quotes/batch", srv.base_url))
        .json(&json!({"text": text}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "import_error");
    assert_eq!(body["rows"][0]["line"], 2);

    // All-or-nothing: the good row was not inserted either.
    let res = client
        .get(format!("{}/items/{item_id}/quotes", srv.base_url))
        .send()
        .await
        .unwrap();
    let quotes: Vec<Value> = res.json().await.unwrap();
    assert!(quotes.is_empty());
}

#[tokio::test]
async fn reorder_renumbers_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap();

    let first = create_item(&client, &srv.base_url, process_id).await;
    let second = create_item(&client, &srv.base_url, process_id).await;
    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/processes/{process_id}/items/reorder", srv.base_url))
        .json(&json!({"item_ids": [second_id, first_id]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/processes/{process_id}/items", srv.base_url))
        .send()
        .await
        .unwrap();
    let items: Vec<Value> = res.json().await.unwrap();
    assert_eq!(items[0]["id"], second_id);
    assert_eq!(items[0]["item_number"], 1);
    assert_eq!(items[1]["id"], first_id);

    // Incomplete permutations are rejected.
    let res = client
        .post(format!("{}/processes/{process_id}/items/reorder", srv.base_url))
        .json(&json!({"item_ids": [first_id]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_reorder");
}

#[tokio::test]
async fn report_totals_follow_the_pricing_strategy() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap();
    let item = create_item(&client, &srv.base_url, process_id).await;
    let item_id = item["id"].as_str().unwrap();

    // Prices 2,4,4,4,5,5,7,9: mean 5, stddev 2, band [3,7], sanitized 29/6.
    for price in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
        let res = client
            .post(format!("{}/items/{item_id}/quotes", srv.base_url))
            .json(&json!({
                "source": "Supplier",
                "quote_date": "2026-08-01",
                "unit_price": price,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!("{}/processes/{process_id}/report", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await.unwrap();

    let row = &report["rows"][0];
    assert_eq!(row["quote_count"], 8);
    assert_eq!(row["statistics"]["mean"], 5.0);
    assert_eq!(row["statistics"]["std_dev"], 2.0);
    assert_eq!(row["statistics"]["valid_quotes"], 6);
    assert_eq!(row["statistics"]["outliers_count"], 2);

    // Default strategy is sanitized: 29/6 per unit, quantity 10.
    let unit = row["unit_estimate"].as_f64().unwrap();
    assert!((unit - 29.0 / 6.0).abs() < 1e-9);
    let total = report["total_estimated"].as_f64().unwrap();
    assert!((total - 290.0 / 6.0).abs() < 1e-9);

    // Switch the item to median pricing and expect the report to follow.
    let res = client
        .put(format!("{}/items/{item_id}", srv.base_url))
        .json(&json!({
            "item_number": 1,
            "specification": "office chair, ergonomic",
            "unit": "unit",
            "quantity": 10.0,
            "pricing_strategy": "median",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let report: Value = client
        .get(format!("{}/processes/{process_id}/report", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["rows"][0]["unit_estimate"], 4.5);
    assert_eq!(report["total_estimated"], 45.0);
}

#[tokio::test]
async fn report_renders_as_csv() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let process = create_process(&client, &srv.base_url).await;
    let process_id = process["id"].as_str().unwrap();
    let item = create_item(&client, &srv.base_url, process_id).await;
    let item_id = item["id"].as_str().unwrap();

    client
        .post(format!("{}/items/{item_id}/quotes", srv.base_url))
        .json(&json!({
            "source": "Supplier",
            "quote_date": "2026-08-01",
            "unit_price": 100.0,
        }))
        .send()
        .await
        .unwrap();

    let res = client
        .get(format!("{}/processes/{process_id}/report?format=csv", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(
        res.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let body = res.text().await.unwrap();
    let mut lines = body.lines();
    assert!(lines.next().unwrap().starts_with("item,specification"));
    assert!(body.contains("office chair"));
    assert!(body.lines().last().unwrap().contains("TOTAL"));
}
