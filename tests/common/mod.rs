//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use topic_collector::config::{Config, RedditCredentials, SearchConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub fn credentials() -> RedditCredentials {
    RedditCredentials {
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        user_agent: Some("topic-collector-tests/1.0".to_string()),
    }
}

/// Configuration pointing every source at `server`.
pub fn config_for(server: &MockServer, output_dir: &std::path::Path) -> Config {
    Config {
        search: SearchConfig {
            topic: "trump".to_string(),
            subreddit: "politics".to_string(),
            boards: vec!["pol".to_string()],
            result_limit: 5,
        },
        reddit: credentials(),
        reddit_auth_url: server.uri(),
        reddit_api_url: server.uri(),
        chan_api_url: server.uri(),
        output_dir: output_dir.to_path_buf(),
        ..Config::for_testing()
    }
}

pub fn catalog_thread(no: u64, sub: Option<&str>, com: &str, replies: u64) -> Value {
    let mut thread = json!({ "no": no, "com": com, "time": 1_700_000_000 + no, "replies": replies });
    if let Some(sub) = sub {
        thread["sub"] = json!(sub);
    }
    thread
}

/// Thread reply listing: the opening post followed by `replies`.
pub fn thread_listing(no: u64, replies: &[(u64, &str)]) -> Value {
    let mut posts = vec![json!({ "no": no, "com": "opening post", "time": 1_700_000_000 })];
    posts.extend(
        replies
            .iter()
            .map(|(reply_no, com)| json!({ "no": reply_no, "com": com, "time": 1_700_000_000 + reply_no })),
    );
    json!({ "posts": posts })
}

pub async fn mount_json(server: &MockServer, http_method: &str, route: &str, body: Value) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, http_method: &str, route: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn reddit_comment(id: &str, author: Option<&str>, replies: Value) -> Value {
    json!({
        "kind": "t1",
        "data": {
            "id": id,
            "body": format!("comment {id}"),
            "author": author,
            "score": 4,
            "created_utc": 1_700_000_500.0,
            "replies": replies
        }
    })
}

pub fn reddit_link(id: &str, author: Option<&str>) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "title": format!("Post {id} about Trump"),
            "selftext": format!("self text {id}"),
            "author": author,
            "created_utc": 1_700_000_400.0,
            "num_comments": 3,
            "score": 250
        }
    })
}

pub fn listing(children: Vec<Value>) -> Value {
    json!({ "kind": "Listing", "data": { "children": children } })
}

/// Token, search and comment endpoints for a two-post Reddit search.
pub async fn mount_reddit_happy_path(server: &MockServer) {
    mount_json(
        server,
        "POST",
        "/api/v1/access_token",
        json!({ "access_token": "test-token", "token_type": "bearer", "expires_in": 86400 }),
    )
    .await;

    mount_json(
        server,
        "GET",
        "/r/politics/search",
        listing(vec![reddit_link("p1", Some("alice")), reddit_link("p2", Some("[deleted]"))]),
    )
    .await;

    mount_json(
        server,
        "GET",
        "/comments/p1",
        json!([
            listing(vec![reddit_link("p1", Some("alice"))]),
            listing(vec![
                reddit_comment(
                    "c1",
                    Some("bob"),
                    listing(vec![reddit_comment("c1a", None, json!(""))]),
                ),
                json!({ "kind": "more", "data": { "count": 40, "children": ["m1", "m2"] } }),
                reddit_comment("c2", Some("carol"), json!("")),
            ]),
        ]),
    )
    .await;

    mount_json(
        server,
        "GET",
        "/comments/p2",
        json!([listing(vec![reddit_link("p2", None)]), listing(vec![])]),
    )
    .await;
}
