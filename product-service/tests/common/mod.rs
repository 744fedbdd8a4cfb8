#![allow(dead_code)]

use product_service::config::{MongoConfig, ProductConfig};
use product_service::services::{InMemoryProductStore, ProductStore};
use product_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Full HTTP server on a random port backed by an in-memory store.
    pub async fn spawn() -> Self {
        let store: Arc<dyn ProductStore> = Arc::new(InMemoryProductStore::new());
        let app = Application::with_store(0, store)
            .await
            .expect("Failed to build test application");
        Self::launch(app).await
    }

    /// Full HTTP server against a live MongoDB (`TEST_MONGODB_URI`), using a
    /// throwaway database.
    pub async fn spawn_with_mongo() -> Self {
        let config = ProductConfig {
            common: CoreConfig {
                port: 0,
                ..CoreConfig::default()
            },
            mongodb: MongoConfig {
                uri: Some(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                database: format!("product_test_{}", uuid::Uuid::new_v4().simple()),
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        Self::launch(app).await
    }

    async fn launch(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling the root route
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create(&self, body: serde_json::Value) -> String {
        let response: serde_json::Value = self
            .client
            .post(self.url("/products"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse response");

        response["insertedId"]
            .as_str()
            .expect("insert should return an id")
            .to_string()
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, serde_json::Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let body = response.json().await.expect("Failed to parse response");
        (status, body)
    }
}
