//! Integration test harness
//!
//! - `TestServer` - spawns the real plazad binary on a random port with an
//!   on-disk SQLite database in a temp directory
//! - `TestClient` - authenticated WebSocket client for presence tests
//! - `TestWorld` - pre-seeded admin account, elements, and a map template
//!
//! # Example
//!
//! ```rust,ignore
//! use harness::{TestClient, TestServer, TestWorld};
//!
//! #[tokio::test]
//! async fn test_two_users_meet() {
//!     let server = TestServer::start().await.unwrap();
//!     let world = TestWorld::create(&server).await.unwrap();
//!     let space_id = world
//!         .create_space(&server, &world.admin_token, false)
//!         .await
//!         .unwrap();
//!
//!     let mut alice = TestClient::connect(&server, "alice").await.unwrap();
//!     alice.join(&space_id).await.unwrap();
//!     let ack = alice.expect("space-joined").await.unwrap();
//!     assert_eq!(ack["payload"]["users"].as_array().unwrap().len(), 0);
//! }
//! ```

mod server;

pub use client::TestClient;
pub use server::TestServer;
pub use world::TestWorld;
