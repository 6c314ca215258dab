use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct MoodEntry {
    id: i64,
    mood: Option<u8>,
    date: Option<String>,
    activities: Vec<String>,
    notes: String,
}

#[derive(Debug, Deserialize)]
struct Review {
    rating: Option<u8>,
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct StatsSummary {
    total_entries: usize,
    best_mood: u8,
    total_reviews: usize,
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    imported: usize,
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

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Mutex;
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for &pid in pids.iter().filter(|pid| **pid > 0) {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
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

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("mood_journal_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/stats")).send().await {
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

async fn spawn_server(quota: Option<usize>) -> TestServer {
    let port = pick_free_port();
    let mut command = Command::new(env!("CARGO_BIN_EXE_mood_journal"));
    command
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_path())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(quota) = quota {
        command.env("APP_STORAGE_QUOTA", quota.to_string());
    }
    let child = command.spawn().expect("failed to spawn server");

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
    let server = Arc::new(spawn_server(None).await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn fetch_entries(client: &Client, base_url: &str) -> Vec<MoodEntry> {
    client
        .get(format!("{base_url}/api/entries"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn fetch_stats(client: &Client, base_url: &str) -> StatsSummary {
    client
        .get(format!("{base_url}/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_create_entry_updates_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = fetch_stats(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "mood": 5, "activities": ["exercise"], "notes": "run" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: MoodEntry = response.json().await.unwrap();
    assert_eq!(created.mood, Some(5));
    assert_eq!(created.activities, vec!["exercise".to_string()]);
    assert!(created.date.is_some());

    let after = fetch_stats(&client, &server.base_url).await;
    assert_eq!(after.total_entries, before.total_entries + 1);
    assert_eq!(after.best_mood, 5);

    let entries = fetch_entries(&client, &server.base_url).await;
    assert_eq!(entries.last(), Some(&created));
}

#[tokio::test]
async fn http_entry_defaults_and_validation() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created: MoodEntry = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created.mood, Some(3));
    assert!(created.activities.is_empty());
    assert!(created.notes.is_empty());

    let response = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "mood": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_delete_entry() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created: MoodEntry = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "mood": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let before = fetch_entries(&client, &server.base_url).await;

    let response = client
        .delete(format!("{}/api/entries/{}", server.base_url, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = fetch_entries(&client, &server.base_url).await;
    let expected: Vec<_> = before.into_iter().filter(|e| e.id != created.id).collect();
    assert_eq!(after, expected);

    let response = client
        .delete(format!("{}/api/entries/{}", server.base_url, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_export_then_import_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "mood": 4, "activities": ["reading"] }))
        .send()
        .await
        .unwrap();
    let original = fetch_entries(&client, &server.base_url).await;

    let response = client
        .get(format!("{}/api/export", server.base_url))
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
    assert!(disposition.contains("wellness-data.json"));
    let exported = response.text().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert!(parsed.get("exportDate").is_some());

    let cleared: ImportResponse = client
        .post(format!("{}/api/import", server.base_url))
        .body(r#"{"entries":[{"id":1,"mood":5,"activities":[],"notes":""}]}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cleared.imported, 1);
    let replaced = fetch_entries(&client, &server.base_url).await;
    assert_eq!(
        replaced,
        vec![MoodEntry {
            id: 1,
            mood: Some(5),
            date: None,
            activities: Vec::new(),
            notes: String::new(),
        }]
    );

    let restored: ImportResponse = client
        .post(format!("{}/api/import", server.base_url))
        .body(exported)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(restored.imported, original.len());
    assert_eq!(fetch_entries(&client, &server.base_url).await, original);
}

#[tokio::test]
async fn http_malformed_import_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = fetch_entries(&client, &server.base_url).await;
    let response = client
        .post(format!("{}/api/import", server.base_url))
        .body("definitely not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(fetch_entries(&client, &server.base_url).await, before);
}

#[tokio::test]
async fn http_reviews_are_listed_and_averaged() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = fetch_stats(&client, &server.base_url).await;
    let response = client
        .post(format!("{}/api/reviews", server.base_url))
        .json(&serde_json::json!({ "rating": 4, "feedback": "helpful" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let reviews: Vec<Review> = client
        .get(format!("{}/api/reviews", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let last = reviews.last().expect("review stored");
    assert_eq!(last.rating, Some(4));
    assert_eq!(last.feedback, "helpful");

    let after = fetch_stats(&client, &server.base_url).await;
    assert_eq!(after.total_reviews, before.total_reviews + 1);
}

#[tokio::test]
async fn http_form_flow_renders_page() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let page = client
        .post(format!("{}/entries", server.base_url))
        .form(&[("mood", "4"), ("activities", "social,work"), ("notes", "<3 friends")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Saved!"));
    assert!(page.contains(r#"id="entriesList""#));
    assert!(page.contains("Activities: social, work"));
    assert!(page.contains("Note: &lt;3 friends"));
}

#[tokio::test]
async fn http_full_storage_rolls_back_entry() {
    let server = spawn_server(Some(200)).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "mood": 3, "notes": "x".repeat(400) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
    assert!(fetch_entries(&client, &server.base_url).await.is_empty());

    let page = client
        .post(format!("{}/entries", server.base_url))
        .form(&[("mood", "3"), ("notes", "y".repeat(400).as_str())])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Storage full!"));
    assert!(fetch_entries(&client, &server.base_url).await.is_empty());
}

#[tokio::test]
async fn http_large_export_imports_back() {
    let server = spawn_server(None).await;
    let client = Client::new();

    for mood in [2, 4, 5] {
        let response = client
            .post(format!("{}/api/entries", server.base_url))
            .json(&serde_json::json!({ "mood": mood, "notes": "n".repeat(900 * 1024) }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let original = fetch_entries(&client, &server.base_url).await;

    let exported = client
        .get(format!("{}/api/export", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(exported.len() > 2 * 1024 * 1024);

    let response = client
        .post(format!("{}/api/import", server.base_url))
        .body(exported)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let imported: ImportResponse = response.json().await.unwrap();
    assert_eq!(imported.imported, 3);
    assert_eq!(fetch_entries(&client, &server.base_url).await, original);
}
