pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod state;
#[cfg(feature = "mongodb")]
pub mod mongo;

use async_trait::async_trait;

/// Driver builds, opens, checks and closes a Client, and derives Database/Collection handles from it
///
/// `#[async_trait]` boxes the futures as `Send`, so a manager can be driven from spawned tasks
/// on a multi-thread runtime.
#[async_trait]
pub trait Driver: Send + Sync {
    type Client: Clone + Send + Sync;
    type Database: Clone + Send + Sync;
    type Collection: Clone + Send + Sync;
    type CollectionOptions: Send;

    /// `From<&str>` carries timeouts raised by the manager
    type Error: std::error::Error + Send + Sync + 'static + for<'a> From<&'a str>;

    ///create Client from config, without touching the network if the driver allows it
    async fn build(&self, config: &ClientConfig) -> Result<Self::Client, Self::Error>;
    ///open the connection behind Client
    async fn open(&self, client: &Self::Client) -> Result<(), Self::Error>;
    ///check server is reachable
    async fn ping(&self, client: &Self::Client) -> Result<(), Self::Error>;
    ///close Client. may be called again if it fails
    async fn disconnect(&self, client: &Self::Client) -> Result<(), Self::Error>;

    /// None means the database cannot be used
    fn database(&self, client: &Self::Client, name: &str) -> Option<Self::Database>;
    /// None means the collection cannot be used
    fn collection(
        &self,
        database: &Self::Database,
        name: &str,
        options: Option<Self::CollectionOptions>,
    ) -> Option<Self::Collection>;
}

pub use config::ClientConfig;
pub use error::{ConnectError, DisconnectError};
pub use manager::ConnectionManager;
pub use state::State;
