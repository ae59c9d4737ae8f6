//! TestServer - end-to-end test harness
//!
//! Spawns the actual plazad binary on a random port with an on-disk SQLite
//! database inside a per-test temp directory, so every test exercises the
//! complete server including CLI parsing and startup migrations.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;

/// Test harness that spawns the actual plazad binary on a random port
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    child: Child,
    /// Temp directory for the database (cleaned up on drop)
    _temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestServer {
    /// Start a new test server instance
    pub async fn start() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");

        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let binary_path = find_binary_path()?;

        let child = Command::new(&binary_path)
            .arg("--bind")
            .arg(addr.to_string())
            .arg("--database")
            .arg(db_path.to_string_lossy().as_ref())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                anyhow::anyhow!("Failed to spawn plazad binary at {:?}: {}", binary_path, e)
            })?;

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until the server answers (max 5 seconds)
        let mut ready = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 5 seconds");
        }

        Ok(Self {
            addr,
            client,
            child,
            _temp_dir: temp_dir,
            db_path,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL for the server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make an authenticated GET request
    pub async fn get_auth(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make an authenticated POST request
    pub async fn post_auth<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        token: &str,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .header("Authorization", format!("Bearer {}", token))
            .json(body)
            .send()
            .await?)
    }

    /// Make an authenticated PUT request
    pub async fn put_auth<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        token: &str,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .put(format!("{}{}", self.base_url(), path))
            .header("Authorization", format!("Bearer {}", token))
            .json(body)
            .send()
            .await?)
    }

    /// Make an authenticated DELETE request
    pub async fn delete_auth(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .delete(format!("{}{}", self.base_url(), path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?)
    }

    /// Make an authenticated DELETE request with a JSON body
    pub async fn delete_auth_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        token: &str,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .delete(format!("{}{}", self.base_url(), path))
            .header("Authorization", format!("Bearer {}", token))
            .json(body)
            .send()
            .await?)
    }

    /// Sign up a fresh account and sign it in, returning (user_id, token).
    /// Usernames get a random suffix so tests never collide.
    pub async fn signup_and_signin(
        &self,
        username_prefix: &str,
        account_type: &str,
    ) -> Result<(String, String)> {
        let username = format!("{}-{}", username_prefix, uuid::Uuid::new_v4());
        let signup = self
            .post(
                "/api/v1/signup",
                &serde_json::json!({
                    "username": username,
                    "password": "123456",
                    "type": account_type,
                }),
            )
            .await?;
        anyhow::ensure!(signup.status().is_success(), "signup failed");
        let body: serde_json::Value = signup.json().await?;
        let user_id = body["userId"].as_str().unwrap().to_string();

        let signin = self
            .post(
                "/api/v1/signin",
                &serde_json::json!({
                    "username": username,
                    "password": "123456",
                }),
            )
            .await?;
        anyhow::ensure!(signin.status().is_success(), "signin failed");
        let body: serde_json::Value = signin.json().await?;
        let token = body["token"].as_str().unwrap().to_string();

        Ok((user_id, token))
    }
}

/// Find the plazad binary path
fn find_binary_path() -> Result<PathBuf> {
    let candidates = [
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/debug/plazad"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/release/plazad"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../target/debug/plazad"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../target/release/plazad"),
    ];

    for path in &candidates {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    anyhow::bail!(
        "Could not find plazad binary. Run 'cargo build' first. Searched: {:?}",
        candidates
    )
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
