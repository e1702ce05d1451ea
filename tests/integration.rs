//! End-to-end tests for the HTTP surface.
//!
//! Each test starts the real server on a free port with a recording model
//! client injected, then drives it over HTTP with `reqwest`.

use anyhow::Result;
use async_trait::async_trait;
use doc_chat::config::Config;
use doc_chat::llm::ModelClient;
use doc_chat::server::run_server_with_client;
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ─── Test Client ────────────────────────────────────────────────────

/// Records every prompt and replies with `"answer <n>"`, or fails with a
/// fixed message when `fail` is set.
#[derive(Default)]
struct RecordingClient {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingClient {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for RecordingClient {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        if self.fail {
            anyhow::bail!("API key not valid. Please pass a valid API key.");
        }
        Ok(format!("answer {}", prompts.len()))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(tmp: &TempDir, port: u16) -> Config {
    let root = tmp.path();
    let config_content = format!(
        r#"
[documents]
root = "{root}/data"

[server]
bind = "127.0.0.1:{port}"
static_dir = "{root}/static"
"#,
        root = root.display(),
        port = port
    );
    toml::from_str(&config_content).unwrap()
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Seeds the document root and static bundle, then starts the server.
async fn start(tmp: &TempDir, client: Arc<RecordingClient>) -> String {
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("handbook.md"), "Vacation policy: 25 days per year.").unwrap();
    fs::write(data.join("servers.csv"), "host,role\nweb1,frontend").unwrap();
    fs::write(data.join("logo.png"), "binary-ish").unwrap();

    let static_dir = tmp.path().join("static");
    fs::create_dir_all(&static_dir).unwrap();
    fs::write(static_dir.join("index.html"), "<html><body>chat page</body></html>").unwrap();

    let port = find_free_port();
    let cfg = test_config(tmp, port);
    tokio::spawn(async move {
        run_server_with_client(&cfg, client).await.ok();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}", port)
}

async fn chat(base: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/chat", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_index_page_served() {
    let tmp = TempDir::new().unwrap();
    let base = start(&tmp, Arc::new(RecordingClient::default())).await;

    let resp = reqwest::get(format!("{}/", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("chat page"));
}

#[tokio::test]
async fn test_chat_empty_or_missing_message_is_400() {
    let tmp = TempDir::new().unwrap();
    let client = Arc::new(RecordingClient::default());
    let base = start(&tmp, client.clone()).await;

    let (status, body) = chat(&base, json!({ "message": "" })).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No message provided" }));

    let (status, body) = chat(&base, json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No message provided");

    // Nothing reached the model and the store is still empty, so the next
    // prompt carries no transcript.
    assert!(client.prompts().is_empty());
    let (status, _) = chat(&base, json!({ "message": "hello" })).await;
    assert_eq!(status, 200);
    assert!(client.prompts()[0].ends_with("Conversation so far:\n\nUser: hello"));
}

#[tokio::test]
async fn test_sequential_chats_carry_transcript() {
    let tmp = TempDir::new().unwrap();
    let client = Arc::new(RecordingClient::default());
    let base = start(&tmp, client.clone()).await;

    let (status, body) = chat(&base, json!({ "message": "How many vacation days?" })).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "response": "answer 1" }));

    let (status, body) = chat(&base, json!({ "message": "And in months?" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["response"], "answer 2");

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 2);

    // Startup context is embedded, supported files only.
    assert!(prompts[0].contains("--- Document: handbook.md ---\nVacation policy: 25 days per year."));
    assert!(prompts[0].contains("--- Document: servers.csv ---"));
    assert!(!prompts[0].contains("logo.png"));

    assert!(prompts[1].ends_with(
        "Conversation so far:\nUser: How many vacation days?\nAssistant: answer 1\n\nUser: And in months?"
    ));
}

#[tokio::test]
async fn test_reset_clears_history() {
    let tmp = TempDir::new().unwrap();
    let client = Arc::new(RecordingClient::default());
    let base = start(&tmp, client.clone()).await;

    chat(&base, json!({ "message": "one" })).await;
    chat(&base, json!({ "message": "two" })).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/reset", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "Conversation reset" }));

    chat(&base, json!({ "message": "three" })).await;
    let prompts = client.prompts();
    let last = prompts.last().unwrap();
    assert!(last.ends_with("Conversation so far:\n\nUser: three"));
    assert!(!last.contains("User: one"));
}

#[tokio::test]
async fn test_model_failure_is_500_with_raw_text() {
    let tmp = TempDir::new().unwrap();
    let client = Arc::new(RecordingClient {
        fail: true,
        ..RecordingClient::default()
    });
    let base = start(&tmp, client).await;

    let (status, body) = chat(&base, json!({ "message": "hello" })).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "API key not valid. Please pass a valid API key.");
}

#[tokio::test]
async fn test_documents_reflects_live_filesystem() {
    let tmp = TempDir::new().unwrap();
    let client = Arc::new(RecordingClient::default());
    let base = start(&tmp, client.clone()).await;

    let body: Value = reqwest::get(format!("{}/documents", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "documents": ["handbook.md", "logo.png", "servers.csv"] }));

    // Added after startup: listed, but not part of the cached context.
    fs::write(tmp.path().join("data/late.txt"), "Late arrival content").unwrap();

    let body: Value = reqwest::get(format!("{}/documents", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap())
        .collect();
    assert!(names.contains(&"late.txt"));

    chat(&base, json!({ "message": "anything new?" })).await;
    let prompts = client.prompts();
    assert!(!prompts[0].contains("Late arrival content"));
    assert!(!prompts[0].contains("late.txt"));
}

#[tokio::test]
async fn test_missing_root_created_at_startup() {
    let tmp = TempDir::new().unwrap();
    let port = find_free_port();
    let cfg = test_config(&tmp, port);
    let client = Arc::new(RecordingClient::default());
    let server_client = client.clone();
    tokio::spawn(async move {
        run_server_with_client(&cfg, server_client).await.ok();
    });
    wait_for_server(port).await;

    assert!(tmp.path().join("data").is_dir());

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/documents", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "documents": [] }));

    let (status, _) = chat(
        &format!("http://127.0.0.1:{}", port),
        json!({ "message": "hi" }),
    )
    .await;
    assert_eq!(status, 200);
    assert!(client.prompts()[0].contains("Here are the documents you have access to:\n\n\n\n---"));
}
