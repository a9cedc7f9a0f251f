//! Integration tests for the 4chan catalog source.

mod common;

use common::{catalog_thread, mount_json, mount_status, thread_listing, TIMEOUT};
use serde_json::json;
use topic_collector::models::{Platform, RecordId};
use topic_collector::sources::ChanSource;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn boards(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_filters_catalog_by_topic() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/pol/catalog.json",
        json!([
            { "page": 1, "threads": [
                catalog_thread(1, Some("Trump rally"), "thoughts?", 12),
                catalog_thread(2, Some("Weather"), "rain again", 4),
            ]},
            { "page": 2, "threads": [
                catalog_thread(3, None, "<p>What is TRUMP doing</p>", 0),
                catalog_thread(4, None, "", 0),
            ]}
        ]),
    )
    .await;
    mount_json(
        &server,
        "GET",
        "/pol/thread/1.json",
        thread_listing(1, &[(11, "first reply"), (12, "<a class=\"quotelink\">&gt;&gt;11</a><br>second")]),
    )
    .await;
    mount_json(&server, "GET", "/pol/thread/3.json", thread_listing(3, &[])).await;

    let source = ChanSource::new(&server.uri(), TIMEOUT).unwrap();
    let posts = source.fetch_posts(&boards(&["pol"]), "trump").await.unwrap();

    let ids: Vec<RecordId> = posts.iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec![RecordId::Number(1), RecordId::Number(3)]);

    let rally = &posts[0];
    assert_eq!(rally.platform, Platform::FourChan);
    assert_eq!(rally.title, "Trump rally");
    assert_eq!(rally.content, "thoughts?");
    assert_eq!(rally.comments_count, 12);
    assert_eq!(rally.comments.len(), 2);
    assert_eq!(rally.comments[0].comment_id, RecordId::Number(11));
    assert_eq!(rally.comments[1].comment_text, "second");
    assert_eq!(rally.board.as_deref(), Some("pol"));
    assert_eq!(rally.topic.as_deref(), Some("trump"));

    assert_eq!(posts[1].title, "");
    assert_eq!(posts[1].content, "What is TRUMP doing");
    assert!(posts[1].comments.is_empty());
}

#[tokio::test]
async fn test_failed_thread_is_skipped() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/pol/catalog.json",
        json!([{ "threads": [
            catalog_thread(10, Some("trump thread A"), "", 1),
            catalog_thread(20, Some("trump thread B"), "", 1),
        ]}]),
    )
    .await;
    mount_status(&server, "GET", "/pol/thread/10.json", 500).await;
    mount_json(&server, "GET", "/pol/thread/20.json", thread_listing(20, &[(21, "ok")])).await;

    let source = ChanSource::new(&server.uri(), TIMEOUT).unwrap();
    let posts = source.fetch_posts(&boards(&["pol"]), "trump").await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, RecordId::Number(20));
}

#[tokio::test]
async fn test_unparseable_thread_is_skipped() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/pol/catalog.json",
        json!([{ "threads": [
            catalog_thread(10, Some("trump"), "", 1),
            catalog_thread(20, Some("trump"), "", 1),
        ]}]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/pol/thread/10.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not found</html>"))
        .mount(&server)
        .await;
    // Reply without a post number.
    mount_json(
        &server,
        "GET",
        "/pol/thread/20.json",
        json!({ "posts": [{ "no": 20, "time": 1 }, { "com": "broken", "time": 2 }] }),
    )
    .await;

    let source = ChanSource::new(&server.uri(), TIMEOUT).unwrap();
    let posts = source.fetch_posts(&boards(&["pol"]), "trump").await.unwrap();

    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_boards_keep_input_order() {
    let server = MockServer::start().await;
    for (board, no) in [("news", 5_u64), ("pol", 6_u64)] {
        mount_json(
            &server,
            "GET",
            &format!("/{board}/catalog.json"),
            json!([{ "threads": [catalog_thread(no, Some("Trump"), "", 0)] }]),
        )
        .await;
        mount_json(
            &server,
            "GET",
            &format!("/{board}/thread/{no}.json"),
            thread_listing(no, &[]),
        )
        .await;
    }

    let source = ChanSource::new(&server.uri(), TIMEOUT).unwrap();
    let posts = source
        .fetch_posts(&boards(&["pol", "news"]), "TRUMP")
        .await
        .unwrap();

    let found: Vec<(Option<&str>, RecordId)> = posts
        .iter()
        .map(|p| (p.board.as_deref(), p.id.clone()))
        .collect();
    assert_eq!(
        found,
        vec![(Some("pol"), RecordId::Number(6)), (Some("news"), RecordId::Number(5))]
    );
}

#[tokio::test]
async fn test_catalog_failure_is_an_error() {
    let server = MockServer::start().await;
    mount_status(&server, "GET", "/pol/catalog.json", 503).await;

    let source = ChanSource::new(&server.uri(), TIMEOUT).unwrap();
    let result = source.fetch_posts(&boards(&["pol"]), "trump").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_catalog_entry_is_skipped() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/pol/catalog.json",
        json!([{ "page": 1, "threads": [
            { "no": 5, "sub": "Trump without a timestamp" },
            catalog_thread(6, Some("Trump again"), "", 1),
        ]}]),
    )
    .await;
    mount_json(&server, "GET", "/pol/thread/6.json", thread_listing(6, &[(61, "ok")])).await;

    let source = ChanSource::new(&server.uri(), TIMEOUT).unwrap();
    let posts = source.fetch_posts(&boards(&["pol"]), "trump").await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, RecordId::Number(6));
    assert_eq!(posts[0].comments[0].comment_text, "ok");
}
