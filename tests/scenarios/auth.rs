//! Auth scenario tests

use serde_json::json;

use crate::harness::TestServer;

#[tokio::test]
async fn test_signup_only_once() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = format!("kirat-{}", uuid::Uuid::new_v4());

    let resp = server
        .post(
            "/api/v1/signup",
            &json!({ "username": username, "password": "123456", "type": "admin" }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["userId"].as_str().is_some());

    // Same username again must not succeed.
    let resp = server
        .post(
            "/api/v1/signup",
            &json!({ "username": username, "password": "123456", "type": "admin" }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn test_signup_rejects_empty_username() {
    let server = TestServer::start().await.expect("Failed to start server");

    let resp = server
        .post(
            "/api/v1/signup",
            &json!({ "username": "", "password": "123456", "type": "admin" }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_signup_rejects_unknown_type() {
    let server = TestServer::start().await.expect("Failed to start server");

    let resp = server
        .post(
            "/api/v1/signup",
            &json!({ "username": "someone", "password": "123456", "type": "wizard" }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_signin_with_correct_credentials() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = format!("kirat-{}", uuid::Uuid::new_v4());

    server
        .post(
            "/api/v1/signup",
            &json!({ "username": username, "password": "123456", "type": "admin" }),
        )
        .await
        .unwrap();

    let resp = server
        .post(
            "/api/v1/signin",
            &json!({ "username": username, "password": "123456" }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn test_signin_with_wrong_password() {
    let server = TestServer::start().await.expect("Failed to start server");
    let username = format!("kirat-{}", uuid::Uuid::new_v4());

    server
        .post(
            "/api/v1/signup",
            &json!({ "username": username, "password": "123456", "type": "admin" }),
        )
        .await
        .unwrap();

    let resp = server
        .post(
            "/api/v1/signin",
            &json!({ "username": username, "password": "1234567" }),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
