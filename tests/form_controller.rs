mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::Notify;

use collection_export::features::export::ExportResponse;
use collection_export::form::{
    AccessGate, DirectorySink, ExportForm, ExportTransport, GENERIC_ERROR_MESSAGE,
    HttpExportTransport, SubmitOutcome, TransportError,
};
use common::{ACCESS_KEY, API_KEY, MockStore, build_app, full_export_config};

/// 启动真实 HTTP 服务（随机端口），返回根地址
async fn spawn_server(store: Arc<MockStore>) -> String {
    let app = build_app(full_export_config(), store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn open_form(database: &str, collection: &str, api_key: &str) -> ExportForm {
    let gate = AccessGate::new(Some(ACCESS_KEY)).evaluate(Some(ACCESS_KEY));
    let form = ExportForm::open(gate).expect("authorized");
    form.set_database(database);
    form.set_collection(collection);
    form.set_api_key(api_key);
    form
}

#[tokio::test]
async fn submit_downloads_pretty_json_file() {
    let docs = vec![json!({"_id": "1", "n": 1}), json!({"_id": "2", "n": 2})];
    let store = Arc::new(MockStore::with_documents(docs.clone()));
    let base = spawn_server(store.clone()).await;

    let transport = HttpExportTransport::from_base(Client::new(), &base, "/api").expect("transport");
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());
    let form = open_form("shop", "orders", API_KEY);

    let before = Utc::now().timestamp_millis();
    let outcome = form.submit(&transport, &sink).await;

    let SubmitOutcome::Downloaded { file_name, count } = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(count, 2);
    let stamp: i64 = file_name
        .strip_prefix("orders_")
        .and_then(|s| s.strip_suffix(".json"))
        .and_then(|s| s.parse().ok())
        .expect("file name pattern");
    assert!(stamp >= before);

    let raw = std::fs::read_to_string(dir.path().join(&file_name)).expect("read file");
    assert!(raw.contains("\n  \"collection\": \"orders\""), "2-space indent");
    let saved: Value = serde_json::from_str(&raw).expect("parse file");
    assert_eq!(saved["count"], 2);
    assert_eq!(saved["database"], "shop");
    assert_eq!(saved["data"], Value::Array(docs));

    let snap = form.snapshot();
    assert!(!snap.loading);
    assert_eq!(snap.error, None);
    assert_eq!(
        snap.success.as_deref(),
        Some("Successfully downloaded 2 documents from orders")
    );
    assert_eq!(store.closes(), 1);
}

#[tokio::test]
async fn server_error_message_is_surfaced() {
    let store = Arc::new(MockStore::default());
    let base = spawn_server(store.clone()).await;
    let transport = HttpExportTransport::from_base(Client::new(), &base, "/api").expect("transport");
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());

    let form = open_form("shop", "orders", "wrong-key");
    let outcome = form.submit(&transport, &sink).await;
    assert_eq!(
        outcome,
        SubmitOutcome::Failed("Unauthorized: Invalid API key".to_string())
    );
    let snap = form.snapshot();
    assert_eq!(snap.error.as_deref(), Some("Unauthorized: Invalid API key"));
    assert_eq!(snap.success, None);
    assert!(!snap.loading);
    assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 0);
    assert_eq!(store.connects(), 0);
}

#[tokio::test]
async fn names_with_reserved_characters_round_trip() {
    let store = Arc::new(MockStore::default());
    let base = spawn_server(store.clone()).await;
    let transport = HttpExportTransport::from_base(Client::new(), &base, "/api").expect("transport");
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());

    let form = open_form("my db", "a&b=c", API_KEY);
    let outcome = form.submit(&transport, &sink).await;
    assert!(matches!(outcome, SubmitOutcome::Downloaded { count: 0, .. }));
    assert_eq!(
        store.queried.lock().unwrap().as_slice(),
        &[("my db".to_string(), "a&b=c".to_string())]
    );
}

/// 在放行前一直挂起的替身，用于观察 loading 期间的重复提交。
struct GatedTransport {
    calls: AtomicUsize,
    release: Notify,
}

#[async_trait]
impl ExportTransport for GatedTransport {
    async fn fetch_export(
        &self,
        database: &str,
        collection: &str,
        _api_key: &str,
    ) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        let body = ExportResponse::new(database, collection, vec![json!({"a": 1})], Utc::now());
        serde_json::to_value(body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[tokio::test]
async fn submit_while_loading_is_ignored() {
    let transport = Arc::new(GatedTransport {
        calls: AtomicUsize::new(0),
        release: Notify::new(),
    });
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = Arc::new(DirectorySink::new(dir.path()));
    let form = Arc::new(open_form("shop", "orders", API_KEY));

    let first = {
        let (form, transport, sink) = (form.clone(), transport.clone(), sink.clone());
        tokio::spawn(async move { form.submit(transport.as_ref(), sink.as_ref()).await })
    };

    tokio::time::timeout(Duration::from_secs(2), async {
        while transport.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("first submit reaches transport");
    assert!(form.is_loading());

    let second = form.submit(transport.as_ref(), sink.as_ref()).await;
    assert_eq!(second, SubmitOutcome::Ignored);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    transport.release.notify_one();
    let first = first.await.expect("join");
    assert!(matches!(first, SubmitOutcome::Downloaded { count: 1, .. }));
    assert!(!form.is_loading());
}

struct FailingTransport(TransportError);

#[async_trait]
impl ExportTransport for FailingTransport {
    async fn fetch_export(
        &self,
        _database: &str,
        _collection: &str,
        _api_key: &str,
    ) -> Result<Value, TransportError> {
        Err(match &self.0 {
            TransportError::Rejected { status, message } => TransportError::Rejected {
                status: *status,
                message: message.clone(),
            },
            TransportError::Network(m) => TransportError::Network(m.clone()),
            TransportError::Decode(m) => TransportError::Decode(m.clone()),
        })
    }
}

#[tokio::test]
async fn failure_messages_fall_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());
    let cases = [
        (
            TransportError::Rejected {
                status: 500,
                message: None,
            },
            "Failed to download collection",
        ),
        (
            TransportError::Network("connection refused".into()),
            "connection refused",
        ),
        (TransportError::Network(String::new()), GENERIC_ERROR_MESSAGE),
    ];
    for (err, expected) in cases {
        let form = open_form("shop", "orders", API_KEY);
        let outcome = form.submit(&FailingTransport(err), &sink).await;
        assert_eq!(outcome, SubmitOutcome::Failed(expected.to_string()));
        assert!(!form.is_loading());
        assert_eq!(form.snapshot().error.as_deref(), Some(expected));
    }
}

#[tokio::test]
async fn unreachable_server_reports_network_error() {
    // 绑定后立即释放端口，得到一个大概率无人监听的地址
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport =
        HttpExportTransport::from_base(Client::new(), &format!("http://{addr}"), "/api")
            .expect("transport");
    let dir = tempfile::tempdir().expect("tempdir");
    let form = open_form("shop", "orders", API_KEY);
    let outcome = form.submit(&transport, &DirectorySink::new(dir.path())).await;
    let SubmitOutcome::Failed(msg) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert!(!msg.is_empty());
    assert!(!form.is_loading());
}

/// 返回固定响应体（含服务端额外字段）的替身
struct FixedBodyTransport(Value);

#[async_trait]
impl ExportTransport for FixedBodyTransport {
    async fn fetch_export(
        &self,
        _database: &str,
        _collection: &str,
        _api_key: &str,
    ) -> Result<Value, TransportError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn saved_file_keeps_every_response_field() {
    let body = json!({
        "collection": "orders",
        "database": "shop",
        "count": 1,
        "data": [{"_id": "1"}],
        "exportedAt": "2026-10-18T09:30:00.123Z",
        "truncated": false,
        "server": {"version": "9.9.9"}
    });
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = DirectorySink::new(dir.path());
    let form = open_form("shop", "orders", API_KEY);

    let outcome = form.submit(&FixedBodyTransport(body.clone()), &sink).await;
    let SubmitOutcome::Downloaded { file_name, count } = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(count, 1);

    let raw = std::fs::read_to_string(dir.path().join(&file_name)).expect("read file");
    let saved: Value = serde_json::from_str(&raw).expect("parse file");
    assert_eq!(saved, body);
    assert_eq!(
        form.snapshot().success.as_deref(),
        Some("Successfully downloaded 1 documents from orders")
    );
}
