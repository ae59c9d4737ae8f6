//! Catalog scenario tests
//!
//! Admin-gated element/avatar/map management plus user avatar metadata.

use serde_json::json;

use crate::harness::{TestServer, TestWorld};

#[tokio::test]
async fn test_user_cannot_hit_admin_endpoints() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, user_token) = server.signup_and_signin("plain-user", "user").await.unwrap();

    let element = server
        .post_auth(
            "/api/v1/admin/element",
            &json!({ "imageUrl": "https://img.example/e.png", "width": 1, "height": 1, "static": true }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(element.status(), 403);

    let map = server
        .post_auth(
            "/api/v1/admin/map",
            &json!({ "thumbnail": "https://img.example/t.png", "dimensions": "100x200", "defaultElements": [] }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(map.status(), 403);

    let avatar = server
        .post_auth(
            "/api/v1/admin/avatar",
            &json!({ "imageUrl": "https://img.example/a.png", "name": "Timmy" }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(avatar.status(), 403);

    let update = server
        .put_auth(
            "/api/v1/admin/element/123",
            &json!({ "imageUrl": "https://img.example/e2.png" }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(update.status(), 403);
}

#[tokio::test]
async fn test_admin_can_hit_admin_endpoints() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, admin_token) = server.signup_and_signin("the-admin", "admin").await.unwrap();

    let element = server
        .post_auth(
            "/api/v1/admin/element",
            &json!({ "imageUrl": "https://img.example/e.png", "width": 1, "height": 1, "static": true }),
            &admin_token,
        )
        .await
        .unwrap();
    assert_eq!(element.status(), 200);

    let map = server
        .post_auth(
            "/api/v1/admin/map",
            &json!({ "thumbnail": "https://img.example/t.png", "dimensions": "100x200", "defaultElements": [] }),
            &admin_token,
        )
        .await
        .unwrap();
    assert_eq!(map.status(), 200);

    let avatar = server
        .post_auth(
            "/api/v1/admin/avatar",
            &json!({ "imageUrl": "https://img.example/a.png" }),
            &admin_token,
        )
        .await
        .unwrap();
    assert_eq!(avatar.status(), 200);
}

#[tokio::test]
async fn test_admin_can_update_element_image() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, admin_token) = server.signup_and_signin("the-admin", "admin").await.unwrap();

    let resp = server
        .post_auth(
            "/api/v1/admin/element",
            &json!({ "imageUrl": "https://img.example/e.png", "width": 1, "height": 1, "static": true }),
            &admin_token,
        )
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let element_id = body["id"].as_str().unwrap();

    let update = server
        .put_auth(
            &format!("/api/v1/admin/element/{}", element_id),
            &json!({ "imageUrl": "https://img.example/e2.png" }),
            &admin_token,
        )
        .await
        .unwrap();
    assert_eq!(update.status(), 200);

    // The new image shows up in the element listing.
    let list = server
        .get_auth("/api/v1/elements", &admin_token)
        .await
        .unwrap();
    let body: serde_json::Value = list.json().await.unwrap();
    let updated = body["elements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == element_id)
        .expect("element missing from listing");
    assert_eq!(updated["imageUrl"], "https://img.example/e2.png");
}

#[tokio::test]
async fn test_avatar_listing_and_metadata() {
    let server = TestServer::start().await.expect("Failed to start server");
    let world = TestWorld::create(&server).await.unwrap();
    let (user_id, user_token) = server.signup_and_signin("avatar-user", "user").await.unwrap();

    let resp = server
        .post_auth(
            "/api/v1/admin/avatar",
            &json!({ "imageUrl": "https://img.example/kirat.png", "name": "Kirat" }),
            &world.admin_token,
        )
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let avatar_id = body["id"].as_str().unwrap().to_string();

    // The avatar is listed for users.
    let list = server.get_auth("/api/v1/avatars", &user_token).await.unwrap();
    let body: serde_json::Value = list.json().await.unwrap();
    let avatars = body["avatars"].as_array().unwrap();
    assert!(!avatars.is_empty());
    assert!(avatars.iter().any(|a| a["id"] == avatar_id.as_str()));

    // Unknown avatar id is refused.
    let resp = server
        .post_auth(
            "/api/v1/user/metadata",
            &json!({ "avatarId": "123456" }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // A real avatar id is accepted.
    let resp = server
        .post_auth(
            "/api/v1/user/metadata",
            &json!({ "avatarId": avatar_id }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Missing auth header is forbidden.
    let resp = server
        .post("/api/v1/user/metadata", &json!({ "avatarId": avatar_id }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Bulk lookup reports the selection.
    let resp = server
        .get_auth(
            &format!("/api/v1/user/metadata/bulk?ids=[{}]", user_id),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let entries = body["avatars"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["userId"], user_id.as_str());
    assert_eq!(entries[0]["avatarId"], avatar_id.as_str());
}
