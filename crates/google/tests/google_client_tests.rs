//! Request shapes and error mapping of the Google Sheets client, verified
//! against a mock HTTP server.

use secrecy::SecretString;
use serde_json::json;
use sheetsync_engine::{
    Error, FsConfigWriter, MajorDimension, ParserRegistry, SheetConfig, SheetsClient,
    SpreadsheetConfig, SyncEngine,
};
use sheetsync_google::{
    AuthConfig, Credentials, GoogleSheetsClient, ProviderSettings, SheetsProvider,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, credentials: Credentials) -> GoogleSheetsClient {
    GoogleSheetsClient::with_http(reqwest::Client::new(), credentials)
        .with_base_url(&server.uri())
        .unwrap()
}

fn metadata_body() -> serde_json::Value {
    json!({
        "sheets": [
            {"properties": {"sheetId": 0, "title": "Enemies"}},
            {"properties": {"sheetId": 1_234_567, "title": "Loot Tables"}}
        ]
    })
}

#[tokio::test]
async fn test_tab_metadata_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1"))
        .and(query_param("includeGridData", "false"))
        .and(query_param("fields", "sheets.properties(sheetId,title)"))
        .and(query_param("key", "api-key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(
        &server,
        Credentials::ApiKey(SecretString::from("api-key-123")),
    );
    let tabs = client.tab_metadata("book-1").await.unwrap();

    assert_eq!(tabs.len(), 2);
    assert_eq!(tabs[0].tab_id, 0);
    assert_eq!(tabs[0].title, "Enemies");
    assert_eq!(tabs[1].tab_id, 1_234_567);
    assert_eq!(tabs[1].title, "Loot Tables");
}

#[tokio::test]
async fn test_range_values_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1/values/Loot%20Tables!A1:C3"))
        .and(query_param("majorDimension", "ROWS"))
        .and(query_param("valueRenderOption", "FORMATTED_VALUE"))
        .and(query_param("dateTimeRenderOption", "SERIAL_NUMBER"))
        .and(header("authorization", "Bearer access-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "'Loot Tables'!A1:C3",
            "majorDimension": "ROWS",
            "values": [["id", "weight"], ["gem", "0,5"], ["coin"]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Credentials::Bearer(SecretString::from("access-xyz")));
    let table = client
        .range_values("book-1", "Loot Tables!A1:C3", MajorDimension::Rows)
        .await
        .unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.rows[1], vec![json!("gem"), json!("0,5")]);
    assert_eq!(table.rows[2], vec![json!("coin")]);
}

#[tokio::test]
async fn test_empty_range_has_no_values_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1/values/Empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Empty!A1:Z1000",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::Anonymous);
    let table = client
        .range_values("book-1", "Empty", MajorDimension::Rows)
        .await
        .unwrap();

    assert!(table.is_empty());
}

#[tokio::test]
async fn test_google_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1/values/Bad!ZZ"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Unable to parse range: Bad!ZZ",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::Anonymous);
    let err = client
        .range_values("book-1", "Bad!ZZ", MajorDimension::Rows)
        .await
        .unwrap_err();

    match err {
        Error::Backend {
            operation,
            status,
            message,
        } => {
            assert_eq!(operation, "get values");
            assert_eq!(status, Some(400));
            assert_eq!(message, "Unable to parse range: Bad!ZZ");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_uses_status_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/locked"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<html>denied</html>"))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::Anonymous);
    let err = client.tab_metadata("locked").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Backend request 'get metadata' failed (HTTP 403): Forbidden"
    );
}

#[tokio::test]
async fn test_connection_failure_is_backend_error() {
    // Nothing listens on port 1
    let client = GoogleSheetsClient::with_http(reqwest::Client::new(), Credentials::Anonymous)
        .with_base_url("http://127.0.0.1:1")
        .unwrap();
    let err = client.tab_metadata("book-1").await.unwrap_err();

    assert!(matches!(err, Error::Backend { status: None, .. }));
}

#[tokio::test]
async fn test_provider_drives_engine_sync() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1/values/Enemies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["id", "name", "hp"], ["e1", "Goblin", "10"], ["e2", "Orc", "25"]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1/values/Loot%20Tables!A1:B2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["id", "weight"], ["gem", "0,5"]]
        })))
        .mount(&server)
        .await;

    let provider = SheetsProvider::with_settings(
        AuthConfig::ApiKey {
            key: Some(SecretString::from("sync-key")),
            key_env: None,
        },
        ProviderSettings {
            base_url: server.uri(),
            ..ProviderSettings::default()
        },
    );
    let client: Arc<dyn SheetsClient> = provider
        .get_or_connect(&CancellationToken::new())
        .await
        .unwrap();

    let temp = tempfile::TempDir::new().unwrap();
    let engine = SyncEngine::new(
        client,
        ParserRegistry::with_builtins(),
        Arc::new(FsConfigWriter::new(temp.path())),
    );
    let config = SpreadsheetConfig::new("Balance", "book-1")
        .with_sheet(SheetConfig::new("Enemies", 0))
        .with_sheet(SheetConfig::new("Loot", 1_234_567).with_range("A1:B2"));

    let report = engine.sync_one(&config).await;

    assert!(report.is_success(), "{:?}", report.outcomes);
    let enemies: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp.path().join("Enemies.json")).unwrap())
            .unwrap();
    assert_eq!(enemies["e2"], json!({"id": "e2", "name": "Orc", "hp": 25}));
    let loot: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(temp.path().join("Loot.json")).unwrap())
            .unwrap();
    assert_eq!(loot["gem"]["weight"], json!(0.5));
}

#[tokio::test]
async fn test_provider_api_key_from_manifest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/book-1"))
        .and(query_param("key", "inline-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_body()))
        .expect(1)
        .mount(&server)
        .await;

    let auth: AuthConfig = toml::from_str("method = \"api-key\"\nkey = \"inline-key\"").unwrap();
    let provider = SheetsProvider::with_settings(
        auth,
        ProviderSettings {
            base_url: server.uri(),
            ..ProviderSettings::default()
        },
    );

    let client = provider
        .get_or_connect(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(client.tab_metadata("book-1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_provider_without_credentials_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata_body()))
        .expect(0)
        .mount(&server)
        .await;

    let provider = SheetsProvider::with_settings(
        AuthConfig::default(),
        ProviderSettings {
            base_url: server.uri(),
            ..ProviderSettings::default()
        },
    );

    let err = provider
        .get_or_connect(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_auth());
}
