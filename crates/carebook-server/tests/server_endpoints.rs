use carebook_server::{AppConfig, build_app};
use carebook_storage::{StorageBackend, StorageConfig};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

async fn start_server(
    cfg: AppConfig,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_app(&cfg).await.expect("build app");

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

fn file_config(path: std::path::PathBuf) -> AppConfig {
    AppConfig {
        storage: StorageConfig {
            backend: StorageBackend::JsonFile,
            path,
            create_if_missing: true,
        },
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn info_endpoints_work() {
    let dir = tempfile::tempdir().unwrap();
    let (base, shutdown_tx, handle) = start_server(file_config(dir.path().join("p.json"))).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Patient management API");

    let resp = client.get(format!("{base}/about")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "A fully functional API to manage patients and their data."
    );

    let resp = client
        .get(format!("{base}/healthz"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "abc-123");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "json-file");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn patient_lifecycle_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patients.json");
    let (base, shutdown_tx, handle) = start_server(file_config(path.clone())).await;
    let client = reqwest::Client::new();

    // POST /create
    let resp = client
        .post(format!("{base}/create"))
        .json(&json!({
            "id": "P001",
            "name": "John Doe",
            "city": "Pune",
            "age": 30,
            "gender": "male",
            "height": 1.7,
            "weight": 70
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Patient created successfully");
    assert_eq!(body["patient_id"], "P001");

    // Duplicate id
    let resp = client
        .post(format!("{base}/create"))
        .json(&json!({
            "id": "P001",
            "name": "Someone Else",
            "city": "Delhi",
            "age": 40,
            "gender": "female",
            "height": 1.6,
            "weight": 55
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "conflict");

    // GET /patient/{id}
    let resp = client
        .get(format!("{base}/patient/P001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "John Doe");
    assert_eq!(body["bmi"], json!(24.22));
    assert_eq!(body["verdict"], "Normal weight");

    // PUT /edit/{id}
    let resp = client
        .put(format!("{base}/edit/P001"))
        .json(&json!({"weight": 80.5}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = client
        .get(format!("{base}/patient/P001"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["weight"], json!(80.5));
    assert_eq!(body["city"], "Pune");
    assert_eq!(body["bmi"], json!(27.85));
    assert_eq!(body["verdict"], "Overweight");

    // GET /view
    let body: Value = client
        .get(format!("{base}/view"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.as_object().unwrap().len(), 1);
    assert_eq!(body["P001"]["age"], 30);

    // DELETE /delete/{id}
    let resp = client
        .delete(format!("{base}/delete/P001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{base}/patient/P001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Patient not found");

    let document = std::fs::read_to_string(&path).unwrap();
    assert!(!document.contains("P001"));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
