use serde_json::{json, Value};
use std::path::Path;
use vk_audience::config::ApiConfig;
use vk_audience::crawler::{ApiFetcher, Coordinator, CrawlEvent};
use vk_audience::storage::{open_shared, SharedStore};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Opens a fresh on-disk store inside the given directory
pub fn open_store(dir: &Path) -> SharedStore {
    open_shared(&dir.join("vk_data.db")).expect("Failed to open store")
}

/// Builds a coordinator that talks to the mock server with a tiny delay
pub fn coordinator(server: &MockServer, store: SharedStore) -> Coordinator {
    let config = ApiConfig {
        base_url: server.uri(),
        request_delay: 1,
        ..ApiConfig::default()
    };
    let fetcher = ApiFetcher::new(&config, "test-token".to_string()).expect("client");
    Coordinator::new(store, fetcher, config.page_size)
}

/// An active account entry
pub fn account(id: i64, sex: i64) -> Value {
    json!({ "id": id, "sex": sex, "first_name": "Test", "last_name": "User" })
}

/// A deactivated account entry
pub fn deactivated(id: i64, reason: &str) -> Value {
    json!({ "id": id, "sex": 2, "deactivated": reason })
}

pub fn items_body(items: Vec<Value>) -> Value {
    json!({ "response": { "count": items.len(), "items": items } })
}

pub fn error_body(code: i64, message: &str) -> Value {
    json!({ "error": { "error_code": code, "error_msg": message } })
}

/// Mounts one page of a paginated method for a given owner parameter
pub async fn mount_page(
    server: &MockServer,
    api_method: &str,
    owner: (&str, &str),
    offset: u64,
    body: Value,
    hits: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", api_method)))
        .and(query_param(owner.0, owner.1))
        .and(query_param("offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(hits)
        .mount(server)
        .await;
}

/// Mounts the single friends.get response for a user
pub async fn mount_friends(server: &MockServer, user_id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/friends.get"))
        .and(query_param("user_id", user_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Drains every event currently buffered in the channel
pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<CrawlEvent>) -> Vec<CrawlEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
