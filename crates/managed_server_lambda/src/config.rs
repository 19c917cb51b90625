use chrono::{SecondsFormat, Utc};
use managed_server_core::contract::{
    InstanceInfo, DEFAULT_MAX_CONNECTIONS, INSTANCE_TYPE_MANAGED, NOT_AVAILABLE,
};

pub const MEMORY_SIZE_VAR: &str = "AWS_LAMBDA_FUNCTION_MEMORY_SIZE";
pub const FUNCTION_NAME_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";
pub const INSTANCE_TYPE_VAR: &str = "INSTANCE_TYPE";
pub const DEMO_NAME_VAR: &str = "DEMO_NAME";
pub const MAX_CONNECTIONS_VAR: &str = "MAX_CONNECTIONS";

/// Values the platform and the stack inject into every function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    pub memory_mb: String,
    pub function_name: String,
    pub instance_type: String,
    pub demo_name: Option<String>,
    pub max_connections: u32,
}

impl RuntimeEnvironment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            memory_mb: non_empty(MEMORY_SIZE_VAR).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            function_name: non_empty(FUNCTION_NAME_VAR)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            instance_type: non_empty(INSTANCE_TYPE_VAR)
                .unwrap_or_else(|| INSTANCE_TYPE_MANAGED.to_string()),
            demo_name: non_empty(DEMO_NAME_VAR),
            max_connections: non_empty(MAX_CONNECTIONS_VAR)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        }
    }

    pub fn instance_info(&self) -> InstanceInfo {
        InstanceInfo {
            instance_type: self.instance_type.clone(),
            memory_mb: self.memory_mb.clone(),
            function_name: self.function_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub environment: RuntimeEnvironment,
    pub timestamp: String,
}

impl InvocationContext {
    pub fn now(environment: RuntimeEnvironment) -> Self {
        Self {
            environment,
            timestamp: utc_timestamp(),
        }
    }
}

/// Current UTC time as RFC 3339 with microseconds and a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
