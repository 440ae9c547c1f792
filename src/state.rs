use std::fmt::{Display, Formatter};

/// Current state of the connection manager
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct State {
    /// A connection is live
    pub connected: bool,
    /// Name of the connected database
    pub database: Option<String>,
    /// Cached collection names, sorted
    pub collections: Vec<String>,
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ connected: {}, database: {}, collections: [{}] }}",
            self.connected,
            self.database.as_deref().unwrap_or("-"),
            self.collections.join(", ")
        )
    }
}
