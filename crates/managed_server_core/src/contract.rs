use serde::{Deserialize, Serialize};

pub const INSTANCE_TYPE_MANAGED: &str = "managed";
pub const NOT_AVAILABLE: &str = "N/A";

pub const DATA_PROCESSING_DEMO: &str = "Lambda Managed Instances - Data Processing";
pub const API_DEMO: &str = "Lambda Managed Instances - API with Connection Pooling";
pub const WEBSOCKET_DEMO: &str = "Lambda Managed Instances - WebSocket Handler";

pub const DATA_PROCESSING_BENEFITS: [&str; 4] = [
    "Extended execution time for large datasets",
    "Optimized memory usage",
    "Cost-efficient per-second billing",
    "Automatic scaling",
];

pub const API_BENEFITS: [&str; 4] = [
    "Persistent database connections",
    "Reduced connection overhead",
    "Improved API response times",
    "Connection pooling optimization",
];

pub const WEBSOCKET_BENEFITS: [&str; 4] = [
    "Persistent WebSocket connections",
    "Real-time message processing",
    "Reduced connection overhead",
    "Scalable real-time applications",
];

/// Connections reported once the simulated pool has been built.
pub const POOL_CONNECTIONS: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceInfo {
    #[serde(rename = "type")]
    pub instance_type: String,
    pub memory_mb: String,
    pub function_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingDetails {
    pub file_size: String,
    pub records_processed: u64,
    pub execution_time_seconds: f64,
    pub timestamp: String,
    pub instance_type: String,
    pub memory_mb: String,
    pub function_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataProcessingBody {
    pub message: String,
    pub demo: String,
    pub details: ProcessingDetails,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: String,
    pub path: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: u32,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolPerformance {
    pub query_time_ms: f64,
    pub connection_pool_active: bool,
    pub available_connections: u32,
    pub max_connections: u32,
    pub cold_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiBody {
    pub message: String,
    pub demo: String,
    pub request: RequestSummary,
    pub data: Vec<UserRecord>,
    pub performance: PoolPerformance,
    pub instance_info: InstanceInfo,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub connection_id: String,
    pub route: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatistics {
    pub active_connections: u64,
    pub messages_processed: u64,
    pub last_activity: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSocketBody {
    pub action: String,
    pub message: String,
    pub demo: String,
    pub connection_info: ConnectionInfo,
    pub statistics: SessionStatistics,
    pub instance_info: InstanceInfo,
    pub benefits: Vec<String>,
}

/// Simulated connection pool held by the API handler between invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolState {
    pub initialized: bool,
    pub connections: u32,
    pub max_connections: u32,
}

impl PoolState {
    pub fn new(max_connections: u32) -> Self {
        Self {
            initialized: false,
            connections: 0,
            max_connections,
        }
    }

    /// Marks the pool as built. Returns `false` when it already was.
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        self.connections = POOL_CONNECTIONS;
        true
    }
}

impl Default for PoolState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONNECTIONS)
    }
}

/// Session counters held by the WebSocket handler between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCounters {
    pub active_connections: u64,
    pub messages_processed: u64,
    pub last_activity: Option<String>,
}

impl SessionCounters {
    pub fn record_connect(&mut self) {
        self.active_connections = self.active_connections.saturating_add(1);
    }

    pub fn record_disconnect(&mut self) {
        self.active_connections = self.active_connections.saturating_sub(1);
    }

    pub fn record_message(&mut self) {
        self.messages_processed = self.messages_processed.saturating_add(1);
    }

    pub fn touch(&mut self, timestamp: impl Into<String>) {
        self.last_activity = Some(timestamp.into());
    }

    pub fn statistics(&self) -> SessionStatistics {
        SessionStatistics {
            active_connections: self.active_connections,
            messages_processed: self.messages_processed,
            last_activity: self.last_activity.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn sample_users() -> Vec<UserRecord> {
    [(1, "Alice", "Admin"), (2, "Bob", "Developer"), (3, "Charlie", "Manager")]
        .into_iter()
        .map(|(id, name, role)| UserRecord {
            id,
            name: name.to_string(),
            role: role.to_string(),
        })
        .collect()
}

pub fn benefits(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
