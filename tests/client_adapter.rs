//! Client adapter tests: the adapter must never surface a failure.

mod common;

use axum::{http::StatusCode, routing::post, Json, Router};
use common::{raw_matches, spawn_app, start_keyed_match_server, test_config, FakeModel, ModelReply};
use lostfound::client::{MatchClient, MatchSession};
use lostfound::config::ClientConfig;
use lostfound::models::{Category, Disposition, Item, ItemStatus};
use lostfound::store::{Command, ItemStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn client_for(endpoint: String) -> MatchClient {
    MatchClient::new(&ClientConfig {
        endpoint,
        timeout_secs: 5,
    })
    .unwrap()
}

fn item(id: &str, disposition: Disposition, title: &str) -> Item {
    Item {
        id: id.to_string(),
        disposition,
        title: title.to_string(),
        category: Category::Electronics,
        description: String::new(),
        location: "Main Library".to_string(),
        date: "2026-10-17".to_string(),
        status: ItemStatus::Reported,
        reporter_id: "u1".to_string(),
        image_url: None,
        matched_item_id: None,
    }
}

/// An endpoint that counts hits and answers with a fixed status and body.
async fn canned_endpoint(status: u16, body: serde_json::Value) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().route(
        "/api/match",
        post(move || {
            let counter = counter.clone();
            let body = body.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::from_u16(status).unwrap(), Json(body))
            }
        }),
    );
    let addr = spawn_app(app).await;
    (format!("http://{}/api/match", addr), hits)
}

#[tokio::test]
async fn test_empty_candidates_never_hit_the_network() {
    let (endpoint, hits) = canned_endpoint(200, json!([])).await;
    let client = client_for(endpoint);

    let target = item("L1", Disposition::Lost, "Wallet");
    assert!(client.find_smart_matches(Some(&target), &[]).await.is_empty());
    assert!(client
        .find_smart_matches(None, &[item("F1", Disposition::Found, "Wallet")])
        .await
        .is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_success_status_returns_empty() {
    let (endpoint, hits) = canned_endpoint(500, json!({ "error": "Missing GEMINI_API_KEY" })).await;
    let client = client_for(endpoint);

    let out = client
        .find_smart_matches(
            Some(&item("L1", Disposition::Lost, "Wallet")),
            &[item("F1", Disposition::Found, "Wallet")],
        )
        .await;
    assert!(out.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_body_returns_empty() {
    for body in [
        json!({ "unexpected": true }),
        json!([{ "lostItemId": "L1" }]),
        json!("nope"),
    ] {
        let (endpoint, _) = canned_endpoint(200, body).await;
        let client = client_for(endpoint);
        let out = client
            .find_smart_matches(
                Some(&item("L1", Disposition::Lost, "Wallet")),
                &[item("F1", Disposition::Found, "Wallet")],
            )
            .await;
        assert!(out.is_empty());
    }
}

#[tokio::test]
async fn test_round_trip_through_server_and_confirm() {
    let model = FakeModel::start(ModelReply::Text(raw_matches(&[("2", 0.92)]))).await;
    let base =
        start_keyed_match_server(&test_config(&model.base_url(), "LOSTFOUND_IT_KEY_CLIENT")).await;
    let client = client_for(format!("{}/api/match", base));

    let mut store = ItemStore::seeded();
    let target = store.get("1").cloned().unwrap();
    let suggestions = client
        .find_smart_matches(Some(&target), &store.match_candidates())
        .await;

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].lost_item_id, "1");
    assert_eq!(suggestions[0].found_item_id, "2");

    // Only unresolved FOUND items reach the prompt as candidates.
    let prompt = model.last_prompt().unwrap();
    assert!(!prompt.contains("Black Leather Wallet"));
    assert!(prompt.contains("Car Keys (Toyota)"));

    store
        .apply(Command::ConfirmMatch {
            lost_item_id: suggestions[0].lost_item_id.clone(),
            found_item_id: suggestions[0].found_item_id.clone(),
        })
        .unwrap();
    assert_eq!(store.get("1").unwrap().status, ItemStatus::Matched);
    assert_eq!(store.get("2").unwrap().matched_item_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_session_delivers_only_latest_result() {
    let (endpoint, hits) = canned_endpoint(
        200,
        json!([{ "lostItemId": "L1", "foundItemId": "F1", "confidence": 0.8, "reasoning": "same" }]),
    )
    .await;
    let mut session = MatchSession::new(Arc::new(client_for(endpoint)));

    let target = item("L1", Disposition::Lost, "Wallet");
    let candidates = vec![item("F1", Disposition::Found, "Wallet")];
    let first = session.begin(target.clone(), candidates.clone()).unwrap();
    let second = session.begin(target, candidates).unwrap();
    assert_ne!(first, second);

    let (id, matches) = session.next_result().await.unwrap();
    assert_eq!(id, second);
    assert_eq!(matches.len(), 1);
    assert!(session.next_result().await.is_none());

    // Both requests were actually sent; the first result was discarded.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_closed_session_sends_nothing() {
    let (endpoint, hits) = canned_endpoint(200, json!([])).await;
    let mut session = MatchSession::new(Arc::new(client_for(endpoint)));

    session.close();
    let id = session.begin(
        item("L1", Disposition::Lost, "Wallet"),
        vec![item("F1", Disposition::Found, "Wallet")],
    );
    assert!(id.is_none());
    assert!(session.next_result().await.is_none());

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
