//! GraphQL client tests against a local HTTP server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use serde_json::json;
use std::time::Duration;
use todo_form::{
    AppConfig, CreateTodoInput, DraftField, GraphQlTodoApi, LoadStatus, RemoteOperation, Session,
    SessionGate, SyncStatus, TodoApi, TodoApp, TodoError, TodoRecord,
};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "da2-test-key";

fn endpoint(server: &MockServer) -> String {
    format!("{}/graphql", server.uri())
}

fn api_key_client(server: &MockServer) -> GraphQlTodoApi {
    let config = AppConfig::with_api_key(endpoint(server), API_KEY);
    GraphQlTodoApi::new(&config, &Session::new("alice")).unwrap()
}

fn list_body() -> serde_json::Value {
    json!({
        "data": {
            "listTodos": {
                "items": [
                    { "id": "1", "name": "Eggs", "description": "A dozen" },
                    null,
                    { "id": "2", "name": "Jam", "description": "Apricot" }
                ]
            }
        }
    })
}

fn assert_remote_failure(result: Result<impl std::fmt::Debug, TodoError>, op: RemoteOperation, fragment: &str) {
    match result {
        Err(TodoError::RemoteCallFailed { operation, reason }) => {
            assert_eq!(operation, op);
            assert!(reason.contains(fragment), "unexpected reason: {reason}");
        },
        other => panic!("expected RemoteCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn list_sends_api_key_and_skips_null_items() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("x-api-key", API_KEY))
        .and(body_string_contains("listTodos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body()))
        .expect(1)
        .mount(&server)
        .await;

    let todos = api_key_client(&server).list().await.unwrap();

    assert_eq!(
        todos,
        vec![
            TodoRecord::stored("1", "Eggs", "A dozen"),
            TodoRecord::stored("2", "Jam", "Apricot"),
        ]
    );
}

#[tokio::test]
async fn user_pool_mode_sends_the_id_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "eyJ.id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig::with_user_pool(endpoint(&server));
    let session = Session::new("alice").with_id_token("eyJ.id-token");
    let client = GraphQlTodoApi::new(&config, &session).unwrap();

    assert_eq!(client.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn create_sends_input_and_returns_stored_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("createTodo"))
        .and(body_partial_json(json!({
            "variables": { "input": { "name": "Milk", "description": "Buy milk" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createTodo": { "id": "srv-1", "name": "Milk", "description": "Buy milk" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = api_key_client(&server)
        .create(CreateTodoInput {
            name: "Milk".to_string(),
            description: "Buy milk".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(record, TodoRecord::stored("srv-1", "Milk", "Buy milk"));
}

#[tokio::test]
async fn graphql_errors_are_remote_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createTodo": null },
            "errors": [
                { "message": "Not Authorized to access createTodo on type Mutation" }
            ]
        })))
        .mount(&server)
        .await;

    let result = api_key_client(&server)
        .create(CreateTodoInput {
            name: "Milk".to_string(),
            description: "Buy milk".to_string(),
        })
        .await;

    assert_remote_failure(result, RemoteOperation::Create, "Not Authorized");
}

#[tokio::test]
async fn http_errors_are_remote_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("UnauthorizedException"))
        .mount(&server)
        .await;

    let result = api_key_client(&server).list().await;
    assert_remote_failure(result, RemoteOperation::List, "HTTP 401");
}

#[tokio::test]
async fn malformed_bodies_are_remote_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let result = api_key_client(&server).list().await;
    assert_remote_failure(result, RemoteOperation::List, "malformed response");
}

#[tokio::test]
async fn null_list_is_a_remote_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "listTodos": null } })),
        )
        .mount(&server)
        .await;

    let result = api_key_client(&server).list().await;
    assert_remote_failure(result, RemoteOperation::List, "listTodos was null");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_remote_failure() {
    let config = AppConfig::with_api_key("http://127.0.0.1:9/graphql", API_KEY)
        .with_request_timeout(Duration::from_secs(2));
    let client = GraphQlTodoApi::new(&config, &Session::new("alice")).unwrap();

    let result = client.list().await;
    assert!(matches!(
        result,
        Err(TodoError::RemoteCallFailed { operation: RemoteOperation::List, .. })
    ));
}

#[tokio::test]
async fn mounted_view_round_trips_through_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("listTodos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("createTodo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createTodo": { "id": "srv-3", "name": "Milk", "description": "Buy milk" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig::with_api_key(endpoint(&server), API_KEY);
    let gate = SessionGate::Authenticated(Session::new("alice"));
    let mut app = TodoApp::mount(gate, |session| Ok(GraphQlTodoApi::new(&config, session)?))
        .await
        .unwrap();
    assert_eq!(app.wait_loaded(Duration::from_secs(5)).await.unwrap(), LoadStatus::Loaded);

    app.set_field(DraftField::Name, "Milk").await.unwrap();
    app.set_field(DraftField::Description, "Buy milk").await.unwrap();
    let mut handle = app.submit().await.unwrap();
    handle.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    let state = app.snapshot().await;
    let ids: Vec<_> = state.records().map(|r| r.id.clone().unwrap_or_default()).collect();
    assert_eq!(ids, ["1", "2", "srv-3"]);
    assert_eq!(state.items[2].sync, SyncStatus::Confirmed);
}
