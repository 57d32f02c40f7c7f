//! Integration tests for `SheetsClient` using wiremock HTTP mocks.

use pricewatch_core::SheetsConfig;
use pricewatch_pipeline::{Cell, Table};
use pricewatch_publish::{PublishError, SheetsClient};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHEET: &str = "/v4/spreadsheets/sheet-123";

fn test_client(base_url: &str, max_retries: u32) -> SheetsClient {
    let config = SheetsConfig {
        sheet_id: "sheet-123".to_string(),
        access_token: "test-token".to_string(),
        api_base: base_url.to_string(),
    };
    SheetsClient::new(&config, 30, "pricewatch-test", max_retries, 0)
        .expect("client construction should not fail")
}

fn tables() -> Vec<Table> {
    vec![
        Table {
            name: "Raw Data",
            columns: &["Brand", "Price"],
            rows: vec![
                vec![Cell::from("Ping"), Cell::from(549.99)],
                vec![Cell::from("Cobra"), Cell::from(899.0)],
            ],
        },
        Table {
            name: "Top Brands",
            columns: &["Brand", "Product_Count"],
            rows: vec![vec![Cell::from("Ping"), Cell::from(1usize)]],
        },
    ]
}

fn titles(names: &[&str]) -> serde_json::Value {
    let sheets: Vec<serde_json::Value> = names
        .iter()
        .map(|n| serde_json::json!({ "properties": { "title": n } }))
        .collect();
    serde_json::json!({ "sheets": sheets })
}

async fn mount_writes(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path_regex(r":clear$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(expected)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/"))
        .and(query_param("valueInputOption", "RAW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn upload_creates_missing_worksheets_and_writes_each_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SHEET))
        .and(query_param("fields", "sheets.properties.title"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(titles(&["Raw Data"])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{SHEET}:batchUpdate")))
        .and(body_partial_json(serde_json::json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": "Top Brands",
                        "gridProperties": { "rowCount": 1000, "columnCount": 20 }
                    }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    mount_writes(&server, 2).await;

    let client = test_client(&server.uri(), 0);
    let uploaded = client
        .upload_report(&tables())
        .await
        .expect("upload should succeed");

    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[0].name, "Raw Data");
    assert_eq!(uploaded[0].rows, 2);
    assert_eq!(uploaded[1].name, "Top Brands");
    assert_eq!(uploaded[1].rows, 1);
}

#[tokio::test]
async fn upload_skips_batch_update_when_all_worksheets_exist() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SHEET))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(titles(&["Raw Data", "Top Brands", "Other"])),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{SHEET}:batchUpdate")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    mount_writes(&server, 2).await;

    let client = test_client(&server.uri(), 0);
    client
        .upload_report(&tables())
        .await
        .expect("upload should succeed");
}

#[tokio::test]
async fn values_payload_has_header_then_rows() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/v4/spreadsheets/sheet-123/values/"))
        .and(body_partial_json(serde_json::json!({
            "range": "'Raw Data'!A1",
            "majorDimension": "ROWS",
            "values": [["Brand", "Price"], ["Ping", 549.99], ["Cobra", 899.0]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r":clear$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    client
        .replace_contents(&tables()[0])
        .await
        .expect("write should succeed");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SHEET))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client
        .upload_report(&tables())
        .await
        .expect_err("403 should fail");

    match err {
        PublishError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SHEET))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SHEET))
        .respond_with(ResponseTemplate::new(200).set_body_json(titles(&["Raw Data"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    let found = client
        .worksheet_titles()
        .await
        .expect("second attempt should succeed");
    assert_eq!(found, vec!["Raw Data".to_string()]);
}

#[tokio::test]
async fn malformed_metadata_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SHEET))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let err = client
        .worksheet_titles()
        .await
        .expect_err("bad body should fail");
    assert!(matches!(err, PublishError::Deserialize { .. }));
}
