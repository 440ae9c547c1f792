#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use single_db::{ClientConfig, ConnectionManager, Driver};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestClient {
    pub id: u64,
    pub config: ClientConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDatabase {
    pub client: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCollection {
    pub serial: u64,
    pub name: String,
    pub options: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TestError(pub String);

impl From<&str> for TestError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    #[default]
    Nothing,
    Build,
    Open,
    Ping,
    Database,
    Collection(&'static str),
}

/// A driver step that never completes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HangAt {
    #[default]
    Nothing,
    Open,
    Ping,
    Disconnect,
}

/// Driver double counting every call
#[derive(Debug, Default)]
pub struct TestDriver {
    pub fail_at: Mutex<FailAt>,
    pub hang_at: Mutex<HangAt>,
    /// how many of the next disconnect calls fail
    pub disconnect_failures: AtomicU64,
    /// names `collection` refuses to derive
    pub missing: Mutex<Vec<String>>,
    pub builds: AtomicU64,
    pub opens: AtomicU64,
    pub pings: AtomicU64,
    pub derivations: AtomicU64,
    pub disconnects: AtomicU64,
    pub configs: Mutex<Vec<ClientConfig>>,
    serial: AtomicU64,
}

impl TestDriver {
    pub fn failing_at(fail_at: FailAt) -> Self {
        let d = Self::default();
        *d.fail_at.lock() = fail_at;
        d
    }

    pub fn hanging_at(hang_at: HangAt) -> Self {
        let d = Self::default();
        *d.hang_at.lock() = hang_at;
        d
    }

    fn fails(&self, at: FailAt) -> bool {
        *self.fail_at.lock() == at
    }

    async fn hang_if(&self, at: HangAt) {
        if *self.hang_at.lock() == at {
            std::future::pending::<()>().await;
        }
    }

    pub fn derivations(&self) -> u64 {
        self.derivations.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> u64 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Driver for TestDriver {
    type Client = TestClient;
    type Database = TestDatabase;
    type Collection = TestCollection;
    type CollectionOptions = String;
    type Error = TestError;

    async fn build(&self, config: &ClientConfig) -> Result<Self::Client, Self::Error> {
        self.configs.lock().push(config.clone());
        if self.fails(FailAt::Build) {
            return Err(TestError::from("build failed"));
        }
        let id = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TestClient {
            id,
            config: config.clone(),
        })
    }

    async fn open(&self, _client: &Self::Client) -> Result<(), Self::Error> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.hang_if(HangAt::Open).await;
        if self.fails(FailAt::Open) {
            return Err(TestError::from("open failed"));
        }
        Ok(())
    }

    async fn ping(&self, _client: &Self::Client) -> Result<(), Self::Error> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.hang_if(HangAt::Ping).await;
        if self.fails(FailAt::Ping) {
            return Err(TestError::from("ping failed"));
        }
        Ok(())
    }

    async fn disconnect(&self, _client: &Self::Client) -> Result<(), Self::Error> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.hang_if(HangAt::Disconnect).await;
        let failed = self
            .disconnect_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(TestError::from("disconnect failed"));
        }
        Ok(())
    }

    fn database(&self, client: &Self::Client, name: &str) -> Option<Self::Database> {
        if self.fails(FailAt::Database) {
            return None;
        }
        Some(TestDatabase {
            client: client.id,
            name: name.to_string(),
        })
    }

    fn collection(
        &self,
        _database: &Self::Database,
        name: &str,
        options: Option<Self::CollectionOptions>,
    ) -> Option<Self::Collection> {
        self.derivations.fetch_add(1, Ordering::SeqCst);
        let refused = matches!(*self.fail_at.lock(), FailAt::Collection(n) if n == name);
        if refused || self.missing.lock().iter().any(|m| m == name) {
            return None;
        }
        Some(TestCollection {
            serial: self.serial.fetch_add(1, Ordering::SeqCst) + 1,
            name: name.to_string(),
            options,
        })
    }
}

pub fn manager() -> ConnectionManager<TestDriver> {
    ConnectionManager::new(TestDriver::default())
}

pub const URI: &str = "mongodb://localhost:27017";
