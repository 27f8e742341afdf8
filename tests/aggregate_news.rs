// tests/aggregate_news.rs
use std::time::Duration;

use chrono::TimeZone;
use morning_digest::config::StaticCredentials;
use morning_digest::ingest::providers::news::NewsClient;
use morning_digest::ingest::types::NewsSource;
use morning_digest::ingest::{aggregate_news, batch_id, news_namespace, Outcome};
use morning_digest::store::{DocumentStore, MemoryStore};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> NewsClient {
    let creds = StaticCredentials::new().with("news-api", "api_key", "k");
    NewsClient::new(&creds)
        .expect("client")
        .with_base_url(&server.uri())
}

fn ok_body(articles: Value) -> Value {
    json!({"status": "ok", "totalResults": 2, "articles": articles})
}

#[tokio::test]
async fn stores_one_batch_then_advances_cursor() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let ns = news_namespace().unwrap();
    let now = chrono_tz::Europe::London
        .with_ymd_and_hms(2026, 10, 18, 7, 5, 0)
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(header("x-api-key", "k"))
        .and(query_param("sources", "bbc-news,reuters"))
        .and(query_param("language", "en"))
        .and(query_param_is_missing("from"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!([
            {"title": "A", "source": {"id": "bbc-news", "name": "BBC News"},
             "url": "https://example.com/a", "publishedAt": "2026-10-18T07:00:00Z"},
            {"title": "B", "source": {"id": "reuters", "name": "Reuters"},
             "url": "https://example.com/b", "publishedAt": "2026-10-18T06:30:00Z"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let out = aggregate_news(&store, &client(&server), "bbc-news,reuters", now)
        .await
        .unwrap();
    assert_eq!(out, Outcome::Inserted(vec![batch_id(&now)]));
    assert_eq!(batch_id(&now), 202610180705);
    assert_eq!(store.count(&ns).await.unwrap(), 1);
    server.reset().await;

    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("from", "2026-10-18T07:00:01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let later = now + chrono::Duration::hours(1);
    let out = aggregate_news(&store, &client(&server), "bbc-news,reuters", later)
        .await
        .unwrap();
    assert_eq!(out, Outcome::NothingNew);
    assert_eq!(store.count(&ns).await.unwrap(), 1);
}

#[tokio::test]
async fn error_status_in_body_is_a_no_op() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error", "code": "rateLimited", "message": "slow down"
        })))
        .mount(&server)
        .await;

    let now = chrono_tz::UTC.with_ymd_and_hms(2026, 10, 18, 7, 0, 0).unwrap();
    let out = aggregate_news(&store, &client(&server), "bbc-news", now)
        .await
        .unwrap();
    assert_eq!(out, Outcome::NothingNew);
    assert_eq!(store.count(&news_namespace().unwrap()).await.unwrap(), 0);
}

#[tokio::test]
async fn http_error_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error", "code": "apiKeyInvalid", "message": "bad key"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .everything("bbc-news", None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("apiKeyInvalid"), "{err}");
}

#[tokio::test]
async fn timeout_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body(json!([])))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(json!([
            {"title": "A", "source": {"name": "BBC News"}, "publishedAt": "2026-10-18T07:00:00Z"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let rsp = client(&server)
        .with_timeout(Duration::from_millis(200))
        .with_retry_backoff(Duration::from_millis(10))
        .everything("bbc-news", None)
        .await
        .unwrap();
    assert_eq!(rsp.articles.len(), 1);
}

#[tokio::test]
async fn second_timeout_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body(json!([])))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let res = client(&server)
        .with_timeout(Duration::from_millis(100))
        .with_retry_backoff(Duration::from_millis(10))
        .everything("bbc-news", None)
        .await;
    assert!(res.is_err());
}
