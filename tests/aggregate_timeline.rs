// tests/aggregate_timeline.rs
use morning_digest::config::StaticCredentials;
use morning_digest::ingest::providers::timeline::TimelineClient;
use morning_digest::ingest::{aggregate_timeline, timeline_namespace, Outcome};
use morning_digest::store::{document_id, DocumentStore, MemoryStore};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn status(id: i64, text: &str) -> Value {
    json!({
        "id": id,
        "id_str": id.to_string(),
        "created_at": "Sun Oct 18 07:12:00 +0000 2026",
        "full_text": text,
        "truncated": false,
        "user": {"screen_name": "northernline"}
    })
}

fn client(server: &MockServer) -> TimelineClient {
    let creds = StaticCredentials::new().with("twitter", "bearer_token", "tok");
    TimelineClient::new(&creds)
        .expect("client")
        .with_base_url(&server.uri())
}

#[tokio::test]
async fn timeline_cursor_only_moves_forward() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let ns = timeline_namespace("northernline").unwrap();

    // First run: empty store, no since_id; upstream is newest-first.
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .and(header("authorization", "Bearer tok"))
        .and(query_param("tweet_mode", "extended"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            status(103, "Northern Line: minor delays"),
            status(102, "Good service"),
            status(101, "Northern Line: part suspended"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let out = aggregate_timeline(&store, &client(&server), "northernline", 20)
        .await
        .unwrap();
    assert_eq!(out, Outcome::Inserted(vec![101, 102, 103]));
    server.reset().await;

    // Second run asks from the cursor; a stale echo of 103 must be dropped.
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .and(query_param("since_id", "103"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([status(104, "Northern Line: good service"), status(103, "dup")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let out = aggregate_timeline(&store, &client(&server), "northernline", 20)
        .await
        .unwrap();
    assert_eq!(out, Outcome::Inserted(vec![104]));
    assert_eq!(store.count(&ns).await.unwrap(), 4);

    let latest = store.find_latest(&ns, None).await.unwrap().unwrap();
    assert_eq!(document_id(&latest), Some(104));
    assert!(latest.get("user").is_none());
    assert!(latest.get("id_str").is_none());
    server.reset().await;

    // Third run: nothing newer.
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .and(query_param("since_id", "104"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let out = aggregate_timeline(&store, &client(&server), "northernline", 20)
        .await
        .unwrap();
    assert_eq!(out, Outcome::NothingNew);
    assert_eq!(store.count(&ns).await.unwrap(), 4);
}

#[tokio::test]
async fn upstream_error_writes_nothing() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    Mock::given(method("GET"))
        .and(path("/statuses/user_timeline.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let res = aggregate_timeline(&store, &client(&server), "northernline", 5).await;
    assert!(res.is_err());
    let ns = timeline_namespace("northernline").unwrap();
    assert_eq!(store.count(&ns).await.unwrap(), 0);
}
