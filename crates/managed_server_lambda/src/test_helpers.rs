//! Adapter fakes shared by unit and integration tests.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::adapters::pacer::Pacer;
use crate::config::{InvocationContext, RuntimeEnvironment};

/// Records requested pauses instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().expect("poisoned mutex").clone()
    }

    pub fn total_paused(&self) -> Duration {
        self.pauses().into_iter().sum()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, duration: Duration) {
        self.pauses
            .lock()
            .expect("poisoned mutex")
            .push(duration);
    }
}

pub fn sample_context() -> InvocationContext {
    InvocationContext {
        environment: RuntimeEnvironment {
            memory_mb: "1024".to_string(),
            function_name: "local-function".to_string(),
            instance_type: "managed".to_string(),
            demo_name: None,
            max_connections: 100,
        },
        timestamp: "2026-01-15T09:30:00.000000Z".to_string(),
    }
}

pub fn response_body(body: &str) -> Value {
    serde_json::from_str(body).expect("response body should be JSON")
}
