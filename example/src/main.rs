use async_trait::async_trait;
use single_db::{ClientConfig, ConnectionManager, Driver};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MemoryError(String);

impl From<&str> for MemoryError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// In-memory stand-in for a document database server
#[derive(Debug)]
pub struct MemoryDriver {
    databases: HashSet<String>,
    next_id: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct MemoryClient {
    pub id: u64,
    pub uri: String,
}

#[derive(Debug, Clone)]
pub struct MemoryCollection {
    pub database: String,
    pub name: String,
}

#[async_trait]
impl Driver for MemoryDriver {
    type Client = MemoryClient;
    type Database = String;
    type Collection = MemoryCollection;
    type CollectionOptions = ();
    type Error = MemoryError;

    async fn build(&self, config: &ClientConfig) -> Result<Self::Client, Self::Error> {
        if !config.uri.starts_with("memory://") {
            return Err(MemoryError(format!("unsupported uri {}", config.uri)));
        }
        Ok(MemoryClient {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            uri: config.uri.clone(),
        })
    }

    async fn open(&self, _client: &Self::Client) -> Result<(), Self::Error> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(())
    }

    async fn ping(&self, _client: &Self::Client) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn disconnect(&self, _client: &Self::Client) -> Result<(), Self::Error> {
        Ok(())
    }

    fn database(&self, _client: &Self::Client, name: &str) -> Option<Self::Database> {
        self.databases.get(name).cloned()
    }

    fn collection(
        &self,
        database: &Self::Database,
        name: &str,
        _options: Option<Self::CollectionOptions>,
    ) -> Option<Self::Collection> {
        Some(MemoryCollection {
            database: database.clone(),
            name: name.to_string(),
        })
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let m = ConnectionManager::new(MemoryDriver {
        databases: HashSet::from(["app".to_string()]),
        next_id: AtomicU64::new(1),
    });
    println!("state = {}", m.state().await);

    if let Err(e) = m.connect("memory://local", "missing", ["users"]).await {
        println!("connect failed in phase {}: {}", e.phase(), e);
    }

    m.connect("memory://local", "app", ["users", "orders"]).await.unwrap();
    println!("state = {}", m.state().await);

    let events = m.collection("events", None).await.unwrap();
    info!(collection = %events.name, database = %events.database, "resolved lazily");
    println!("state = {}", m.state().await);

    m.disconnect().await.unwrap();
    println!("state = {}", m.state().await);
}
