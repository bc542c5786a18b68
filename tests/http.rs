use once_cell::sync::Lazy;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct SessionSnapshot {
    team: String,
    pages: Vec<String>,
    current_page: String,
    current_index: usize,
    screenshot_mode: bool,
}

#[derive(Debug, Deserialize)]
struct KpiResult {
    status: String,
    deviation_text: String,
    formatted_value: String,
    formatted_target: String,
    semantic_color: String,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_performance_dialogue"))
        .env("PORT", port.to_string())
        .env("DASHBOARD_PREVIEW_ROWS", "25")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

fn browser() -> Client {
    Client::builder().cookie_store(true).build().unwrap()
}

async fn snapshot(client: &Client, base_url: &str) -> SessionSnapshot {
    client
        .get(format!("{base_url}/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_evaluate_kpi() {
    let server = shared_server().await;
    let client = Client::new();

    let result: KpiResult = client
        .post(format!("{}/api/kpi/evaluate", server.base_url))
        .json(&serde_json::json!({ "value": 80, "target": 100, "higher_is_better": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result.status, "achieved");
    assert_eq!(result.deviation_text, "+20.0%");
    assert_eq!(result.formatted_value, "80.0");
    assert_eq!(result.formatted_target, "100.0");
    assert_eq!(result.semantic_color, "positive");

    let degenerate: KpiResult = client
        .post(format!("{}/api/kpi/evaluate", server.base_url))
        .json(&serde_json::json!({ "value": 5, "target": 0, "is_percentage": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(degenerate.status, "not_applicable");
    assert_eq!(degenerate.semantic_color, "neutral");
}

#[tokio::test]
async fn http_sessions_are_isolated() {
    let server = shared_server().await;
    let alice = browser();
    let bob = browser();

    let added: SessionSnapshot = alice
        .post(format!("{}/api/pages", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(added.pages, ["Dashboard", "Additional Content", "Additional Page 1"]);

    let alice_state = snapshot(&alice, &server.base_url).await;
    assert_eq!(alice_state.pages.len(), 3);

    let bob_state = snapshot(&bob, &server.base_url).await;
    assert_eq!(bob_state.pages, ["Dashboard", "Additional Content"]);
    assert_eq!(bob_state.current_page, "Dashboard");
    assert_eq!(bob_state.team, "pud");
    assert!(!bob_state.screenshot_mode);
}

#[tokio::test]
async fn http_navigation_wraps_and_removal_resets() {
    let server = shared_server().await;
    let client = browser();

    client
        .post(format!("{}/api/pages", server.base_url))
        .send()
        .await
        .unwrap();

    let back: SessionSnapshot = client
        .post(format!("{}/api/nav", server.base_url))
        .json(&serde_json::json!({ "direction": "previous" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(back.current_page, "Additional Page 1");
    assert_eq!(back.current_index, 2);

    let removed: SessionSnapshot = client
        .delete(format!("{}/api/pages", server.base_url))
        .json(&serde_json::json!({ "page": "Additional Page 1" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed.current_page, "Dashboard");
    assert_eq!(removed.current_index, 0);

    let protected = client
        .delete(format!("{}/api/pages", server.base_url))
        .json(&serde_json::json!({ "page": "Dashboard" }))
        .send()
        .await
        .unwrap();
    assert_eq!(protected.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_form_edits_render_on_dashboard() {
    let server = shared_server().await;
    let client = browser();

    let response = client
        .post(format!("{}/kpis/add", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/kpis/update", server.base_url))
        .form(&[
            ("index", "0"),
            ("name", "First Time Delivery"),
            ("value", "55.26"),
            ("target", "50"),
            ("higher_is_better", "on"),
            ("is_percentage", "on"),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    client
        .post(format!("{}/team-news/add", server.base_url))
        .form(&[("content", "Welcome to the new shift lead")])
        .send()
        .await
        .unwrap();

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("First Time Delivery"));
    assert!(page.contains("55.3%"));
    assert!(page.contains("Target: 50.0%"));
    assert!(page.contains("Welcome to the new shift lead"));
}

#[tokio::test]
async fn http_spreadsheet_preview_is_truncated() {
    let server = shared_server().await;
    let client = browser();

    client
        .post(format!("{}/nav/next", server.base_url))
        .send()
        .await
        .unwrap();

    let mut csv = String::from("Route,Stops\n");
    for i in 0..40 {
        csv.push_str(&format!("R{i},{}\n", 80 + i));
    }
    let part = multipart::Part::bytes(csv.into_bytes())
        .file_name("routes.csv")
        .mime_str("text/csv")
        .unwrap();
    let response = client
        .post(format!("{}/content/spreadsheets", server.base_url))
        .multipart(multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("routes.csv"));
    assert!(page.contains("Rows: 25 | Columns: 2"));
    assert!(page.contains("R24"));
    assert!(!page.contains("R25<"));
}

#[tokio::test]
async fn http_guide_download() {
    let server = shared_server().await;
    let client = browser();

    let response = client
        .get(format!("{}/guide", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.contains("Team_PUD_Screenshot_Guide_"));

    let body = response.text().await.unwrap();
    assert!(body.starts_with("# PUD Performance Dialogue Dashboard Screenshot Guide"));
    assert!(body.contains("1. **Dashboard**"));
    assert!(body.contains("2. **Additional Content**"));
}

fn file_part(bytes: &[u8], file_name: &str, mime: &str) -> multipart::Form {
    let part = multipart::Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap();
    multipart::Form::new().part("file", part)
}

#[tokio::test]
async fn http_image_uploads_are_served_back() {
    let server = shared_server().await;
    let client = browser();
    let chart = b"\x89PNG\r\n\x1a\nchart";

    let rejected = client
        .post(format!("{}/performance-image", server.base_url))
        .multipart(file_part(b"plain text", "notes.txt", "text/plain"))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/performance-image", server.base_url))
        .multipart(file_part(chart, "chart.png", "image/png"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let page = response.text().await.unwrap();
    assert!(page.contains("/media/performance-image"));
    assert_eq!(page.matches("class=\"empty-kpi-slot\"").count(), 2);

    let media = client
        .get(format!("{}/media/performance-image", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(
        media.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(media.bytes().await.unwrap().as_ref(), chart);

    client
        .post(format!("{}/nav/next", server.base_url))
        .send()
        .await
        .unwrap();
    let response = client
        .post(format!("{}/content/pictures", server.base_url))
        .multipart(file_part(b"GIF89a-floor", "floor.gif", "image/gif"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let picture = client
        .get(format!("{}/media/pictures/0", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(
        picture.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
        "image/gif"
    );
    assert_eq!(picture.bytes().await.unwrap().as_ref(), b"GIF89a-floor");

    let missing = client
        .get(format!("{}/media/pictures/1", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_non_finite_kpi_is_rejected() {
    let server = shared_server().await;
    let client = browser();

    client
        .post(format!("{}/kpis/add", server.base_url))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/kpis/update", server.base_url))
        .form(&[("index", "0"), ("name", "OTD"), ("value", "NaN"), ("target", "95")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!page.contains("NaN"));
}
