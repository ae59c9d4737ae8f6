//! Space scenario tests
//!
//! Creation with and without a map template, ownership rules, and
//! boundary-checked element placement.

use serde_json::json;

use crate::harness::{TestServer, TestWorld};

#[tokio::test]
async fn test_create_space_from_map() {
    let server = TestServer::start().await.expect("Failed to start server");
    let world = TestWorld::create(&server).await.unwrap();
    let (_, user_token) = server.signup_and_signin("space-user", "user").await.unwrap();

    let space_id = world.create_space(&server, &user_token, true).await.unwrap();

    // The map's three placements were copied in.
    let resp = server
        .get_auth(&format!("/api/v1/space/{}", space_id), &user_token)
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["dimensions"], "100x200");
    assert_eq!(body["elements"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_empty_space() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, user_token) = server.signup_and_signin("space-user", "user").await.unwrap();

    let resp = server
        .post_auth(
            "/api/v1/space",
            &json!({ "name": "Test", "dimensions": "100x200" }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let space_id = body["spaceId"].as_str().unwrap();

    let resp = server
        .get_auth(&format!("/api/v1/space/{}", space_id), &user_token)
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["elements"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_space_requires_dimensions_or_map() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, user_token) = server.signup_and_signin("space-user", "user").await.unwrap();

    let resp = server
        .post_auth("/api/v1/space", &json!({ "name": "Test" }), &user_token)
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_delete_space_rules() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, owner_token) = server.signup_and_signin("owner", "user").await.unwrap();
    let (_, other_token) = server.signup_and_signin("other", "user").await.unwrap();

    // Unknown space.
    let resp = server
        .delete_auth("/api/v1/space/randomIdDoesntExist", &owner_token)
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = server
        .post_auth(
            "/api/v1/space",
            &json!({ "name": "Test", "dimensions": "100x200" }),
            &owner_token,
        )
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let space_id = body["spaceId"].as_str().unwrap().to_string();

    // Another user cannot delete it.
    let resp = server
        .delete_auth(&format!("/api/v1/space/{}", space_id), &other_token)
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The owner can.
    let resp = server
        .delete_auth(&format!("/api/v1/space/{}", space_id), &owner_token)
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_list_own_spaces() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, user_token) = server.signup_and_signin("lister", "user").await.unwrap();

    let resp = server.get_auth("/api/v1/space/all", &user_token).await.unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["spaces"].as_array().unwrap().is_empty());

    let resp = server
        .post_auth(
            "/api/v1/space",
            &json!({ "name": "Test", "dimensions": "100x200" }),
            &user_token,
        )
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let space_id = body["spaceId"].as_str().unwrap().to_string();

    let resp = server.get_auth("/api/v1/space/all", &user_token).await.unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let spaces = body["spaces"].as_array().unwrap();
    assert_eq!(spaces.len(), 1);
    assert!(spaces.iter().any(|s| s["id"] == space_id.as_str()));
}

#[tokio::test]
async fn test_unknown_space_id_is_400() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_, user_token) = server.signup_and_signin("viewer", "user").await.unwrap();

    let resp = server
        .get_auth("/api/v1/space/123kasdk01", &user_token)
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_element_placement_lifecycle() {
    let server = TestServer::start().await.expect("Failed to start server");
    let world = TestWorld::create(&server).await.unwrap();
    let (_, user_token) = server.signup_and_signin("placer", "user").await.unwrap();
    let space_id = world.create_space(&server, &user_token, true).await.unwrap();

    // Delete one of the copied placements.
    let resp = server
        .get_auth(&format!("/api/v1/space/{}", space_id), &user_token)
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let placement_id = body["elements"][0]["id"].as_str().unwrap().to_string();

    let resp = server
        .delete_auth_json(
            "/api/v1/space/element",
            &json!({ "id": placement_id }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .get_auth(&format!("/api/v1/space/{}", space_id), &user_token)
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["elements"].as_array().unwrap().len(), 2);

    // Add one back.
    let resp = server
        .post_auth(
            "/api/v1/space/element",
            &json!({
                "spaceId": space_id,
                "elementId": world.element1_id,
                "x": 20,
                "y": 20,
            }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .get_auth(&format!("/api/v1/space/{}", space_id), &user_token)
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["elements"].as_array().unwrap().len(), 3);

    // Placement outside the boundary is refused.
    let resp = server
        .post_auth(
            "/api/v1/space/element",
            &json!({
                "spaceId": space_id,
                "elementId": world.element1_id,
                "x": 200000,
                "y": 2000000,
            }),
            &user_token,
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
