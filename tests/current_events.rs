// tests/current_events.rs
use chrono::NaiveDate;
use morning_digest::digest;
use morning_digest::ingest::providers::wiki::WikiClient;
use morning_digest::ingest::{aggregate_current_events, current_events_namespace, Outcome};
use morning_digest::store::{DocumentStore, MemoryStore, Upsert};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(item: &str) -> String {
    format!(
        r#"<html><body>
<div id="2026_October_18" class="vevent">
  <div class="current-events-heading">October 18, 2026 (Sunday)</div>
  <div class="current-events-content description">
    <ul><li><a href="/wiki/Item">{item}</a> happened.</li></ul>
  </div>
</div>
</body></html>"#
    )
}

async fn mount(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/portal"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn upsert_replaces_todays_block() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let ns = current_events_namespace().unwrap();
    let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let client = WikiClient::new()
        .unwrap()
        .with_page_url(&format!("{}/portal", server.uri()));

    mount(&server, page("First")).await;
    let out = aggregate_current_events(&store, &client, day).await.unwrap();
    assert_eq!(out, Outcome::Upserted(Upsert::Inserted(20261018)));
    server.reset().await;

    mount(&server, page("Second")).await;
    let out = aggregate_current_events(&store, &client, day).await.unwrap();
    assert_eq!(out, Outcome::Upserted(Upsert::Replaced(20261018)));
    assert_eq!(store.count(&ns).await.unwrap(), 1);

    let stored = digest::current_events(&store, day).await.unwrap().unwrap();
    assert_eq!(stored.date, "18 Oct 2026");
    assert!(stored.text.contains("Second happened."), "{}", stored.text);
    assert!(!stored.text.contains("<a "));
    assert!(!stored.text.contains("(Sunday)"));
}

#[tokio::test]
async fn day_not_yet_published_is_a_no_op() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    mount(&server, page("Only yesterday")).await;
    let client = WikiClient::new()
        .unwrap()
        .with_page_url(&format!("{}/portal", server.uri()));

    let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let out = aggregate_current_events(&store, &client, day).await.unwrap();
    assert_eq!(out, Outcome::NothingNew);
    assert!(digest::current_events(&store, day).await.unwrap().is_none());
}
