//! Orchestrator client tests against a mock HTTP server
//!
//! Run with: `cargo test --test orchestrator_client_test`

use serde_json::json;
use task_worker::{OrchestratorClient, TaskStatus, WorkerError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OrchestratorClient {
    OrchestratorClient::new(&server.uri(), "test-key", None).expect("client")
}

#[tokio::test]
async fn test_register_sends_name_and_capabilities() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bots/register"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({"name": "worker-1", "capabilities": ["general"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "bot-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let identity = client_for(&server)
        .register("worker-1", &["general".to_string()])
        .await
        .unwrap();

    assert_eq!(identity.id, "bot-42");
    assert_eq!(identity.name, "worker-1");
    assert_eq!(identity.capabilities, vec!["general"]);
    server.verify().await;
}

#[tokio::test]
async fn test_register_without_id_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bots/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "worker-1"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .register("worker-1", &["general".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_list_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "t1", "title": "Sort list", "description": "Sort [3,1,2]", "status": "open"},
            {"id": "t2", "title": "Ship", "description": "", "status": "delivered: done",
             "assignee": "bot-7", "project_id": "p1"}
        ])))
        .mount(&server)
        .await;

    let tasks = client_for(&server).list_tasks().await.unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].status, TaskStatus::Open);
    assert_eq!(tasks[1].status, TaskStatus::Delivered);
    assert_eq!(tasks[1].assignee.as_deref(), Some("bot-7"));
}

#[tokio::test]
async fn test_list_tasks_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database on fire"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_tasks().await.unwrap_err();

    match err {
        WorkerError::HttpStatusError { status, body, endpoint } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database on fire");
            assert_eq!(endpoint, "/tasks");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_is_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client_for(&server).list_tasks().await.unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_list_tasks_malformed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": []})))
        .mount(&server)
        .await;

    let err = client_for(&server).list_tasks().await.unwrap_err();

    assert!(matches!(err, WorkerError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_list_tasks_skips_bad_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 7, "description": null, "status": "delivered"},
            {"id": "t0", "title": "No status"},
            {"id": "t3", "title": null, "description": null, "status": "review"},
            {"id": "t1", "title": "Sort list", "description": "Sort [3,1,2]", "status": "open"}
        ])))
        .mount(&server)
        .await;

    let tasks = client_for(&server).list_tasks().await.unwrap();

    let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t3", "t1"]);
    assert_eq!(tasks[0].title, "");
    assert!(tasks[1].is_open());
}

#[tokio::test]
async fn test_assign_task_body_and_ack() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks/assign"))
        .and(body_json(json!({"task_id": "t1", "bot_id": "bot-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false})))
        .expect(1)
        .mount(&server)
        .await;

    let granted = client_for(&server).assign_task("t1", "bot-1").await.unwrap();

    assert!(!granted);
    server.verify().await;
}

#[tokio::test]
async fn test_update_status_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tasks/status"))
        .and(body_json(json!({"task_id": "t1", "status": "in_progress"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let ok = client_for(&server)
        .update_status("t1", TaskStatus::InProgress)
        .await
        .unwrap();

    assert!(ok);
    server.verify().await;
}

#[tokio::test]
async fn test_deliver_returns_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deliver"))
        .and(body_json(json!({"task_id": "t1", "summary": "all sorted"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).deliver("t1", "all sorted").await.unwrap();

    assert_eq!(response, json!({"ok": true}));
    server.verify().await;
}

#[tokio::test]
async fn test_health_and_intake() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tasks/intake"))
        .and(body_json(json!({"project_id": "p1", "title": "T", "description": "D"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "t-new"})))
        .mount(&server)
        .await;

    let client = client_for(&server);

    assert!(client.health().await.unwrap());
    assert_eq!(client.intake_task("p1", "T", "D").await.unwrap(), "t-new");
}

#[tokio::test]
async fn test_unreachable_orchestrator() {
    // Nothing listens on the discard port
    let client = OrchestratorClient::new("http://127.0.0.1:9", "k", None).unwrap();
    let err = client.list_tasks().await.unwrap_err();

    assert!(matches!(err, WorkerError::RequestError { .. }));
}
