use thiserror::Error;

/// Why `connect` failed. Every variant except `AlreadyConnected` leaves the manager disconnected.
#[derive(Error, Debug)]
pub enum ConnectError<E> {
    #[error("already connected")]
    AlreadyConnected,

    #[error("creating client: {0}")]
    ClientConstructionFailed(#[source] E),

    #[error("connecting client: {0}")]
    ConnectionFailed(#[source] E),

    #[error("sending ping: {0}")]
    PingFailed(#[source] E),

    #[error("cannot get database: {0}")]
    DatabaseNotFound(String),

    #[error("cannot get collection: {0}")]
    CollectionNotFound(String),
}

impl<E> ConnectError<E> {
    /// Name of the connect phase that failed
    pub fn phase(&self) -> &'static str {
        match self {
            Self::AlreadyConnected => "validate",
            Self::ClientConstructionFailed(_) => "client",
            Self::ConnectionFailed(_) => "connect",
            Self::PingFailed(_) => "ping",
            Self::DatabaseNotFound(_) => "database",
            Self::CollectionNotFound(_) => "collection",
        }
    }
}

/// Why `disconnect` failed. The manager stays connected on `Driver`.
#[derive(Error, Debug)]
pub enum DisconnectError<E> {
    #[error("not connected")]
    NotConnected,

    #[error(transparent)]
    Driver(E),
}
