pub const CONNECT_ROUTE: &str = "$connect";
pub const DISCONNECT_ROUTE: &str = "$disconnect";
pub const DEFAULT_ROUTE: &str = "$default";
pub const MISSING_ROUTE: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebSocketRoute {
    Connect,
    Disconnect,
    Message,
    Unknown(String),
}

impl WebSocketRoute {
    pub fn from_route_key(route_key: &str) -> Self {
        match route_key {
            CONNECT_ROUTE => Self::Connect,
            DISCONNECT_ROUTE => Self::Disconnect,
            DEFAULT_ROUTE => Self::Message,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn route_key(&self) -> &str {
        match self {
            Self::Connect => CONNECT_ROUTE,
            Self::Disconnect => DISCONNECT_ROUTE,
            Self::Message => DEFAULT_ROUTE,
            Self::Unknown(key) => key,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Connect => "Connected",
            Self::Disconnect => "Disconnected",
            Self::Message => "Message Received",
            Self::Unknown(_) => "Unknown",
        }
    }
}
