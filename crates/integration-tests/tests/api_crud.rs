//! JSON API create/read/update/delete as a logged-in admin.

#![allow(clippy::unwrap_used)]

use portfolio_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_singleton_post_replaces_value() {
    let ctx = TestContext::with_portfolio(json!({
        "profile": {"name": "Old", "title": "Intern"}
    }))
    .await;
    let session = ctx.login().await;

    let resp = session
        .apply(ctx.client.post(ctx.url("/api/profile")))
        .json(&json!({"name": "A"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({"success": true}));

    let data: Value = ctx
        .client
        .get(ctx.url("/api/data"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(data["profile"], json!({"name": "A"}));
}

#[tokio::test]
async fn test_collection_entries_created_updated_deleted() {
    let ctx = TestContext::new().await;
    let session = ctx.login().await;

    let mut ids = Vec::new();
    for title in ["First", "Second"] {
        let resp: Value = session
            .apply(ctx.client.post(ctx.url("/api/projects")))
            .json(&json!({"title": title, "year": 2023}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(resp["success"], true);
        ids.push(resp["id"].as_str().unwrap().to_owned());
    }
    assert_ne!(ids[0], ids[1]);

    // Partial update leaves other fields alone
    let resp = session
        .apply(ctx.client.put(ctx.url(&format!("/api/projects/{}", ids[0]))))
        .json(&json!({"year": 2024}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // POST on an entry is the same operation as PUT
    let resp = session
        .apply(ctx.client.post(ctx.url(&format!("/api/projects/{}", ids[1]))))
        .json(&json!({"url": "https://example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = ctx.stored().await;
    assert_eq!(
        stored["projects"][&ids[0]],
        json!({"title": "First", "year": 2024})
    );
    assert_eq!(
        stored["projects"][&ids[1]],
        json!({"title": "Second", "year": 2023, "url": "https://example.com"})
    );

    // Delete twice: the second is a no-op success
    for _ in 0..2 {
        let resp = session
            .apply(ctx.client.delete(ctx.url(&format!("/api/projects/{}", ids[0]))))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.json::<Value>().await.unwrap(), json!({"success": true}));
    }
    let stored = ctx.stored().await;
    assert!(stored["projects"].get(&ids[0]).is_none());
    assert!(stored["projects"].get(&ids[1]).is_some());
}

#[tokio::test]
async fn test_empty_body_is_accepted() {
    let ctx = TestContext::new().await;
    let session = ctx.login().await;

    let resp = session
        .apply(ctx.client.post(ctx.url("/api/notes")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn test_admins_collection_is_forbidden() {
    let ctx = TestContext::new().await;
    let session = ctx.login().await;
    let before = ctx.stored().await;

    let resp = session
        .apply(ctx.client.post(ctx.url("/api/admins")))
        .json(&json!({"email": "evil@example.com", "password_hash": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"error": "forbidden_category"})
    );

    let resp = session
        .apply(ctx.client.delete(ctx.url("/api/admins/-admin")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    assert_eq!(ctx.stored().await, before);
}

#[tokio::test]
async fn test_invalid_keys_and_bodies_are_rejected() {
    let ctx = TestContext::new().await;
    let session = ctx.login().await;

    let resp = session
        .apply(ctx.client.post(ctx.url("/api/bad.name")))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await.unwrap()["error"], "invalid_key");

    let resp = session
        .apply(ctx.client.post(ctx.url("/api/projects")))
        .json(&json!(["not", "an", "object"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
