/// Settings a Driver needs to build a Client
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClientConfig {
    /// Connection string, parsed by the driver
    pub uri: String,
    /// Automatic retry of writes. ConnectionManager always builds with `false`,
    /// retrying is left to the caller.
    pub retry_writes: bool,
}

impl ClientConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            retry_writes: false,
        }
    }
}
