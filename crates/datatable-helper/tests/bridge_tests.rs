use datatable_helper::adapters::bridge::{BridgeHandler, BridgeRequest, PROTOCOL_VERSION};
use datatable_helper::core::connection::WorkerHandle;
use datatable_helper::{ResponseMode, ResponseOptions, TableRegistry};
use rusqlite::Connection;
use serde_json::{json, Value};

fn setup(dir: &tempfile::TempDir) -> BridgeHandler {
    let db_path = dir.path().join("app.sqlite");
    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email VARCHAR(120), password TEXT);
         INSERT INTO users (email, password) VALUES
           ('ann@example.com', 'x'), ('bob@example.com', 'y'), ('cat@test.org', 'z');",
    )
    .unwrap();
    drop(conn);

    let registry = TableRegistry::from_value(&json!({
        "tables": [
            { "table": "users", "route": "/users", "exclude_columns": ["password"] }
        ]
    }))
    .unwrap();
    let worker = WorkerHandle::spawn(&db_path, 1_000).unwrap();
    BridgeHandler::new(
        registry,
        worker,
        ResponseOptions {
            mode: ResponseMode::Counted,
            debug: false,
        },
    )
}

fn request(cmd: &str, payload: Value) -> BridgeRequest {
    serde_json::from_value(json!({
        "v": PROTOCOL_VERSION,
        "id": "1",
        "cmd": cmd,
        "payload": payload
    }))
    .unwrap()
}

async fn call(handler: &BridgeHandler, cmd: &str, payload: Value) -> Value {
    serde_json::to_value(handler.handle(request(cmd, payload)).await).unwrap()
}

#[tokio::test]
async fn records_from_structured_request() {
    let dir = tempfile::tempdir().unwrap();
    let handler = setup(&dir);

    let resp = call(
        &handler,
        "records",
        json!({
            "route": "/users",
            "request": { "search": { "value": "example.com" }, "order": [{ "column": 1, "dir": "desc" }], "start": 0, "length": 1 }
        }),
    )
    .await;

    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["data"]["recordsFiltered"], 2);
    assert_eq!(resp["data"]["recordsTotal"], 3);
    let rows = resp["data"]["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], "bob@example.com");
    assert!(rows[0].get("password").is_none());
}

#[tokio::test]
async fn records_from_form_fields() {
    let dir = tempfile::tempdir().unwrap();
    let handler = setup(&dir);

    let resp = call(
        &handler,
        "records",
        json!({
            "route": "/users",
            "form": { "draw": "4", "order": "1", "start": "1", "length": "-1", "search[value]": "" }
        }),
    )
    .await;

    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["data"]["draw"], 4);
    let emails: Vec<&str> = resp["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["bob@example.com", "cat@test.org"]);
}

#[tokio::test]
async fn errors_carry_codes() {
    let dir = tempfile::tempdir().unwrap();
    let handler = setup(&dir);

    let resp = call(&handler, "records", json!({ "route": "/users", "request": { "order": 9 } })).await;
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["code"], "ORDER_OUT_OF_RANGE");

    let resp = call(&handler, "records", json!({ "route": "/nope" })).await;
    assert_eq!(resp["code"], "INVALID_REQUEST");

    let resp = call(&handler, "drop", json!({})).await;
    assert_eq!(resp["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn routes_columns_and_markup() {
    let dir = tempfile::tempdir().unwrap();
    let handler = setup(&dir);

    let resp = call(&handler, "routes", Value::Null).await;
    assert_eq!(resp["data"], json!(["/users"]));

    let resp = call(&handler, "columns", json!({ "route": "/users" })).await;
    let cols = resp["data"].as_array().unwrap();
    assert_eq!(cols.len(), 2);
    assert_eq!(cols[1]["name"], "email");
    assert_eq!(cols[1]["searchable"], true);

    let resp = call(&handler, "markup", json!({ "route": "/users", "auto_initialize": false })).await;
    let html = resp["data"].as_str().unwrap();
    assert!(html.contains(r#"data-route="/users""#));
    assert!(html.contains(r#"data-auto-initialize="false""#));
}
