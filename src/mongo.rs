//! MongoDB backend for [`ConnectionManager`](crate::ConnectionManager).
//!
//! ```rust,no_run
//! use single_db::mongo;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! mongo::global::connect("mongodb://localhost:27017", "app", ["users", "orders"]).await?;
//! let users = mongo::global::collection("users", None).await;
//! assert!(users.is_some());
//! mongo::global::disconnect().await?;
//! # Ok(())
//! # }
//! ```

use crate::{ClientConfig, Driver};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, CollectionOptions};
use mongodb::{Client, Collection, Database};
use thiserror::Error;

/// Error of [`MongoDriver`]
#[derive(Error, Debug)]
pub enum MongoError {
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    /// Raised outside the driver, e.g. an elapsed connect timeout
    #[error("{0}")]
    Message(String),
}

impl From<&str> for MongoError {
    fn from(s: &str) -> Self {
        Self::Message(s.to_string())
    }
}

/// Driver backed by the official `mongodb` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDriver;

pub type MongoManager = crate::ConnectionManager<MongoDriver>;

#[async_trait]
impl Driver for MongoDriver {
    type Client = Client;
    type Database = Database;
    type Collection = Collection<Document>;
    type CollectionOptions = CollectionOptions;
    type Error = MongoError;

    async fn build(&self, config: &ClientConfig) -> Result<Self::Client, Self::Error> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.retry_writes = Some(config.retry_writes);
        Ok(Client::with_options(options)?)
    }

    async fn open(&self, client: &Self::Client) -> Result<(), Self::Error> {
        client.warm_connection_pool().await;
        Ok(())
    }

    async fn ping(&self, client: &Self::Client) -> Result<(), Self::Error> {
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn disconnect(&self, client: &Self::Client) -> Result<(), Self::Error> {
        client.clone().shutdown().await;
        Ok(())
    }

    fn database(&self, client: &Self::Client, name: &str) -> Option<Self::Database> {
        if name.is_empty() {
            return None;
        }
        Some(client.database(name))
    }

    fn collection(
        &self,
        database: &Self::Database,
        name: &str,
        options: Option<Self::CollectionOptions>,
    ) -> Option<Self::Collection> {
        if name.is_empty() {
            return None;
        }
        Some(database.collection_with_options(name, options.unwrap_or_default()))
    }
}

/// Process-wide default manager and functions forwarding to it.
///
/// Opt-in: nothing is created until first use. Code that needs several connections,
/// or injects the manager in tests, should construct its own [`MongoManager`].
pub mod global {
    use super::{MongoDriver, MongoError, MongoManager};
    use crate::{ConnectError, DisconnectError};
    use mongodb::bson::Document;
    use mongodb::options::CollectionOptions;
    use mongodb::{Client, Collection, Database};
    use std::sync::LazyLock;

    static DEFAULT: LazyLock<MongoManager> = LazyLock::new(|| MongoManager::new(MongoDriver));

    /// The shared manager
    pub fn manager() -> &'static MongoManager {
        &DEFAULT
    }

    pub async fn connect<I, S>(
        uri: &str,
        database: &str,
        collections: I,
    ) -> Result<(), ConnectError<MongoError>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        DEFAULT.connect(uri, database, collections).await
    }

    pub async fn disconnect() -> Result<(), DisconnectError<MongoError>> {
        DEFAULT.disconnect().await
    }

    pub async fn is_connected() -> bool {
        DEFAULT.is_connected().await
    }

    pub async fn client() -> Option<Client> {
        DEFAULT.client().await
    }

    pub async fn database() -> Option<Database> {
        DEFAULT.database().await
    }

    pub async fn collection(
        name: &str,
        options: Option<CollectionOptions>,
    ) -> Option<Collection<Document>> {
        DEFAULT.collection(name, options).await
    }
}
