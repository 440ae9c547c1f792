use crate::cache::CollectionCache;
use crate::config::ClientConfig;
use crate::error::{ConnectError, DisconnectError};
use crate::state::State;
use crate::Driver;
use dark_std::sync::AtomicDuration;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Everything that exists only while connected
struct Session<D: Driver> {
    client: D::Client,
    database: D::Database,
    database_name: String,
}

/// ConnectionManager owns at most one connection and caches the collection handles derived from it.
///
/// A new manager is disconnected and ready to use. Clones share the same connection.
/// Dropping a connected manager does not close the connection, call `disconnect` first.
pub struct ConnectionManager<D: Driver> {
    pub driver: Arc<D>,
    session: Arc<RwLock<Option<Session<D>>>>,
    collections: Arc<CollectionCache<D::Collection>>,
    //timeout of the open and ping steps of connect, default None = wait for the driver
    pub connect_timeout: Arc<AtomicDuration>,
    //bound on the teardown retries after a failed connect, default None = retry until success
    pub teardown_timeout: Arc<AtomicDuration>,
}

impl<D: Driver> Debug for ConnectionManager<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // a connect/disconnect in progress shows as None
        let connected = self.session.try_read().ok().map(|s| s.is_some());
        f.debug_struct("ConnectionManager")
            .field("connected", &connected)
            .field("collections", &self.collections)
            .field("connect_timeout", &self.connect_timeout.get())
            .field("teardown_timeout", &self.teardown_timeout.get())
            .finish()
    }
}

impl<D: Driver> Clone for ConnectionManager<D> {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver.clone(),
            session: self.session.clone(),
            collections: self.collections.clone(),
            connect_timeout: self.connect_timeout.clone(),
            teardown_timeout: self.teardown_timeout.clone(),
        }
    }
}

impl<D: Driver + Default> Default for ConnectionManager<D> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

impl<D: Driver> ConnectionManager<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
            session: Arc::new(RwLock::new(None)),
            collections: Arc::new(CollectionCache::new()),
            connect_timeout: Arc::new(AtomicDuration::new(None)),
            teardown_timeout: Arc::new(AtomicDuration::new(None)),
        }
    }

    /// Connect to `database` and pre-warm the cache with `collections`.
    ///
    /// Either every step succeeds, or the client is torn down and the manager is left disconnected
    /// with nothing cached. Writes are never retried by the driver.
    /// Open and ping are bounded by `connect_timeout`; an elapsed step fails like a driver error.
    pub async fn connect<I, S>(
        &self,
        uri: &str,
        database: &str,
        collections: I,
    ) -> Result<(), ConnectError<D::Error>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = collections
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let mut session = self.session.write().await;
        if session.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }
        let client = self
            .driver
            .build(&ClientConfig::new(uri))
            .await
            .map_err(|e| {
                warn!(error = %e, "creating client failed");
                ConnectError::ClientConstructionFailed(e)
            })?;
        match self.establish(&client, database, &names).await {
            Ok((db, prewarmed)) => {
                let count = prewarmed.len();
                self.collections.replace(prewarmed);
                *session = Some(Session {
                    client,
                    database: db,
                    database_name: database.to_string(),
                });
                info!(database, prewarmed = count, "connected");
                Ok(())
            }
            Err(e) => {
                warn!(phase = e.phase(), error = %e, "connect failed, tearing down client");
                self.teardown(client).await;
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        client: &D::Client,
        database: &str,
        names: &[String],
    ) -> Result<(D::Database, HashMap<String, D::Collection>), ConnectError<D::Error>> {
        self.within_connect_timeout("open", self.driver.open(client))
            .await
            .map_err(ConnectError::ConnectionFailed)?;
        self.within_connect_timeout("ping", self.driver.ping(client))
            .await
            .map_err(ConnectError::PingFailed)?;
        let db = self
            .driver
            .database(client, database)
            .ok_or_else(|| ConnectError::DatabaseNotFound(database.to_string()))?;
        let mut prewarmed = HashMap::with_capacity(names.len());
        for name in names {
            let collection = self
                .driver
                .collection(&db, name, None)
                .ok_or_else(|| ConnectError::CollectionNotFound(name.clone()))?;
            prewarmed.insert(name.clone(), collection);
        }
        Ok((db, prewarmed))
    }

    async fn within_connect_timeout<F>(&self, step: &str, f: F) -> Result<(), D::Error>
    where
        F: Future<Output = Result<(), D::Error>>,
    {
        match self.connect_timeout.get() {
            None => f.await,
            Some(d) => tokio::time::timeout(d, f)
                .await
                .map_err(|e| D::Error::from(format!("{}_timeout={}", step, e).as_str()))?,
        }
    }

    /// Disconnect `client` until the driver reports success or `teardown_timeout` elapses
    async fn teardown(&self, client: D::Client) {
        let deadline = self.teardown_timeout.get().map(|d| Instant::now() + d);
        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            let result = match deadline {
                None => self.driver.disconnect(&client).await,
                // a hanging attempt counts as a failed one
                Some(d) => tokio::time::timeout(
                    d.saturating_duration_since(Instant::now()),
                    self.driver.disconnect(&client),
                )
                .await
                .unwrap_or_else(|e| Err(D::Error::from(format!("disconnect_timeout={}", e).as_str()))),
            };
            match result {
                Ok(()) => {
                    debug!(attempts, "client torn down");
                    break;
                }
                Err(e) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        error!(attempts, error = %e, "giving up tearing down client, dropping it");
                        break;
                    }
                    warn!(attempts, error = %e, "tearing down client failed, retrying");
                    tokio::task::yield_now().await;
                }
            }
        }
        drop(client);
    }

    /// Disconnect the live connection.
    ///
    /// A driver error is returned as is and the manager stays connected; the caller decides whether to retry.
    pub async fn disconnect(&self) -> Result<(), DisconnectError<D::Error>> {
        let mut session = self.session.write().await;
        let Some(current) = session.as_ref() else {
            return Err(DisconnectError::NotConnected);
        };
        if let Err(e) = self.driver.disconnect(&current.client).await {
            warn!(error = %e, "disconnect failed, connection state kept");
            return Err(DisconnectError::Driver(e));
        }
        if let Some(old) = session.take() {
            info!(database = %old.database_name, "disconnected");
        }
        self.collections.clear();
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// None if not connected
    pub async fn client(&self) -> Option<D::Client> {
        self.session.read().await.as_ref().map(|s| s.client.clone())
    }

    /// None if not connected
    pub async fn database(&self) -> Option<D::Database> {
        self.session.read().await.as_ref().map(|s| s.database.clone())
    }

    /// Cached collection handle for `name`, derived with `options` on first use.
    ///
    /// `options` is ignored when `name` is already cached. Returns None if not connected
    /// or if the driver cannot derive the collection.
    pub async fn collection(
        &self,
        name: &str,
        options: Option<D::CollectionOptions>,
    ) -> Option<D::Collection> {
        // held shared so a disconnect cannot clear the cache between derive and insert
        let session = self.session.read().await;
        let current = session.as_ref()?;
        self.collections.get_or_derive(name, || {
            debug!(collection = name, "deriving collection handle");
            self.driver.collection(&current.database, name, options)
        })
    }

    pub async fn state(&self) -> State {
        let session = self.session.read().await;
        State {
            connected: session.is_some(),
            database: session.as_ref().map(|s| s.database_name.clone()),
            collections: self.collections.names(),
        }
    }

    /// Bound the open and ping steps of connect. None waits as long as the driver does.
    pub fn set_connect_timeout(&self, duration: Option<Duration>) {
        self.connect_timeout.store(duration);
    }

    pub fn get_connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.get()
    }

    /// Bound the teardown retries after a failed connect. None retries until success.
    pub fn set_teardown_timeout(&self, duration: Option<Duration>) {
        self.teardown_timeout.store(duration);
    }

    pub fn get_teardown_timeout(&self) -> Option<Duration> {
        self.teardown_timeout.get()
    }
}
