// Integration tests for the `Galileo` facade and its services, against wiremock.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use galileo_core::models::{CreateMissionRequest, JobStatus};
use galileo_core::{CoreError, Galileo, SdkConfig};

const NS: &str = "/galileo/user_interface/v1";
const TOKEN: &str = "/galileo/landing_zone/v1/oauth/token";

// ── Helpers ─────────────────────────────────────────────────────────

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

fn config_for(server: &MockServer) -> SdkConfig {
    SdkConfig {
        backend: Some(server.uri()),
        ..SdkConfig::default()
    }
}

async fn connect(server: &MockServer, config: SdkConfig) -> Galileo {
    Galileo::connect_with_env(
        config,
        env(&[("GALILEO_TOKEN", "acc"), ("GALILEO_REFRESH_TOKEN", "ref")]),
    )
    .await
    .unwrap_or_else(|e| panic!("connect to {} failed: {e}", server.uri()))
}

fn job_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "jobid": id,
        "time_created": 1_700_000_000,
        "last_updated": 1_700_000_060,
        "status": status,
        "stationid": "st-1"
    })
}

// ── Connection ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_env_tokens_skip_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let galileo = connect(&server, config_for(&server)).await;
    assert!(!galileo.events_connected().await);
    galileo.disconnect().await;
}

#[tokio::test]
async fn test_env_password_logs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .and(body_json(json!({
            "username": "ada",
            "password": "pw",
            "grant_type": "password"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "acc",
            "refresh_token": "ref"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Galileo::connect_with_env(
        config_for(&server),
        env(&[("GALILEO_USER", "ada"), ("GALILEO_PASSWORD", "pw")]),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_missing_credentials() {
    let server = MockServer::start().await;
    let err = Galileo::connect_with_env(config_for(&server), env(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::MissingCredentials));
}

#[tokio::test]
async fn test_universe_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{NS}/universe")))
        .and(header("universe-id", "uv-1"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "universes": [{ "id": "uv-1", "name": "Lab" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = SdkConfig {
        universe: Some("uv-1".into()),
        ..config_for(&server)
    };
    let galileo = connect(&server, config).await;
    let universes = galileo.universes().list().await.unwrap();
    assert_eq!(universes[0].name, "Lab");
}

// ── Services ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_machine_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{NS}/machines/m-404")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "nope" })))
        .mount(&server)
        .await;

    let galileo = connect(&server, config_for(&server)).await;
    let err = galileo.machines().get("m-404").await.unwrap_err();
    assert_eq!(err.to_string(), "machine not found: m-404");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_empty_station_name_is_rejected_locally() {
    let server = MockServer::start().await;
    let galileo = connect(&server, config_for(&server)).await;

    let request = galileo_core::models::CreateStationRequest {
        name: "  ".into(),
        user_ids: vec![],
        description: String::new(),
    };
    let err = galileo.stations().create(&request).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "name"));
}

#[tokio::test]
async fn test_create_and_run_uploads_every_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("main.py"), "print('hi')").unwrap();
    std::fs::write(dir.path().join("data").join("in.csv"), "a,b").unwrap();

    Mock::given(method("POST"))
        .and(path(format!("{NS}/projects")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "project": { "id": "p-1", "name": "demo" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{NS}/projects/p-1/files")))
        .and(header("filename", "data/in.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{NS}/projects/p-1/files")))
        .and(header("filename", "main.py"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{NS}/projects/p-1/jobs")))
        .and(body_json(json!({ "station_id": "st-1", "machine_id": "m-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": job_json("j-1", "uploaded")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let galileo = connect(&server, config_for(&server)).await;
    let job = galileo
        .missions()
        .create_and_run(
            &CreateMissionRequest::new("demo"),
            dir.path(),
            "st-1",
            Some("m-1"),
        )
        .await
        .unwrap();

    assert_eq!(job.job_id, "j-1");
    assert_eq!(job.status, JobStatus::Uploaded);
}

#[tokio::test]
async fn test_download_job_results_fetches_each_file() {
    let server = MockServer::start().await;
    let dest = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("{NS}/jobs/j-1/results")))
        .and(query_param_is_missing("filename"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                { "filename": "a.txt", "path": "/out" },
                { "filename": "b.txt", "path": "/out/logs" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{NS}/jobs/j-1/results")))
        .and(query_param("filename", "a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"A".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{NS}/jobs/j-1/results")))
        .and(query_param("filename", "b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"B".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let galileo = connect(&server, config_for(&server)).await;
    let written = galileo
        .jobs()
        .download_job_results("j-1", dest.path())
        .await
        .unwrap();

    assert_eq!(
        written,
        vec![
            dest.path().join("out").join("a.txt"),
            dest.path().join("out/logs").join("b.txt"),
        ]
    );
    assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "B");
}
