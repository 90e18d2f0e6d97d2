use kpi_report_bot::models::{Branch, CommandResponse, MetricKind, PeriodSlot, Snapshot};
use kpi_report_bot::{router, AppState, MetricStore};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use tempfile::TempDir;

struct TestServer {
    base_url: String,
    data_path: PathBuf,
    _dir: TempDir,
}

async fn spawn_server() -> TestServer {
    let dir = tempfile::tempdir().expect("temp dir");
    let data_path = dir.path().join("state.json");
    let state = AppState::new(data_path.clone(), MetricStore::new());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind random port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        data_path,
        _dir: dir,
    }
}

fn values(value: i64) -> String {
    vec![value.to_string(); Branch::COUNT].join(" ")
}

async fn command(client: &Client, server: &TestServer, text: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/command", server.base_url))
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await
        .unwrap()
}

async fn snapshot(client: &Client, server: &TestServer) -> Snapshot {
    client
        .get(format!("{}/api/snapshot", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_commands_fill_store_and_render_report() {
    let server = spawn_server().await;
    let client = Client::new();

    let response = command(&client, &server, "/set_mtd June 2025").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: CommandResponse = response.json().await.unwrap();
    assert_eq!(body.reply, "✅ MTD period set: JUNE 2025");

    let response = command(&client, &server, &format!("/set_tgt {}", values(200))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = command(&client, &server, &format!("/set_real {}", values(150))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let current = snapshot(&client, &server).await;
    assert_eq!(current.metric(Branch::Sibolga, MetricKind::Target), Some(200));
    assert_eq!(current.metric(Branch::Binjai, MetricKind::Actual), Some(150));
    assert_eq!(current.period(PeriodSlot::Mtd).unwrap().year, 2025);

    let response = client
        .get(format!("{}/api/report.png", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    let png = response.bytes().await.unwrap();
    assert_eq!(&png[..4], b"\x89PNG");

    let response = command(&client, &server, "/print_table").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn http_invalid_commands_are_rejected_without_changes() {
    let server = spawn_server().await;
    let client = Client::new();
    let before = snapshot(&client, &server).await;

    let response = command(&client, &server, "/set_tgt 1 2 3").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.unwrap(),
        "Usage: /set_tgt <10 values, one for each TELDA>"
    );

    let response = command(&client, &server, "/launch").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = command(&client, &server, "   ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = command(&client, &server, &format!("set_tgt {}", values(5))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.unwrap(),
        "text must contain a command"
    );

    assert_eq!(snapshot(&client, &server).await, before);
}

#[tokio::test]
async fn http_report_without_data_is_a_conflict() {
    let server = spawn_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/report.png", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        response.text().await.unwrap(),
        "MTD month and year not set. Use /set_mtd to set them."
    );
}

#[tokio::test]
async fn http_save_persists_snapshot() {
    let server = spawn_server().await;
    let client = Client::new();

    command(&client, &server, "/set ytd_real toba 31").await;
    let response = command(&client, &server, "/save").await;
    assert_eq!(response.status(), StatusCode::OK);

    let restored = MetricStore::restore(&server.data_path).await;
    assert_eq!(restored.metric(Branch::Toba, MetricKind::YtdActual), Some(31));
    assert_eq!(restored.snapshot(), snapshot(&client, &server).await);
}
