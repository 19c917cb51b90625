use std::time::{Duration, Instant};

use managed_server_core::contract::{
    benefits, round_to_hundredths, sample_users, ApiBody, PoolPerformance, PoolState,
    RequestSummary, API_BENEFITS, API_DEMO,
};
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::pacer::Pacer;
use crate::adapters::state_store::StateStore;
use crate::config::InvocationContext;
use crate::error::HandlerError;
use crate::handlers::lenient_text;
use crate::handlers::response::{cors_json_headers, json_response, ApiGatewayResponse};

const COMPONENT: &str = "api_handler";

pub const POOL_SETUP_DELAY: Duration = Duration::from_millis(500);
pub const QUERY_DELAY: Duration = Duration::from_millis(100);
pub const POOL_STATUS_HEADER: &str = "X-Connection-Pool";

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_PATH: &str = "/";

/// Accepts both REST-style proxy events (`httpMethod`, `path`) and function
/// URL events (`requestContext.http.method`, `rawPath`).
#[derive(Debug, Default, Deserialize)]
pub struct ApiEvent {
    #[serde(rename = "httpMethod", default)]
    pub http_method: Option<Value>,
    #[serde(default)]
    pub path: Option<Value>,
    #[serde(rename = "rawPath", default)]
    pub raw_path: Option<Value>,
    #[serde(rename = "requestContext", default)]
    pub request_context: Option<Value>,
}

impl ApiEvent {
    pub fn method(&self) -> String {
        lenient_text(self.http_method.as_ref())
            .or_else(|| {
                lenient_text(
                    self.request_context
                        .as_ref()
                        .and_then(|context| context.pointer("/http/method")),
                )
            })
            .unwrap_or_else(|| DEFAULT_METHOD.to_string())
    }

    pub fn path(&self) -> String {
        lenient_text(self.path.as_ref())
            .or_else(|| lenient_text(self.raw_path.as_ref()))
            .unwrap_or_else(|| DEFAULT_PATH.to_string())
    }
}

pub fn handle_api_event(
    event: Value,
    context: &InvocationContext,
    pool_store: &impl StateStore<PoolState>,
    pacer: &impl Pacer,
) -> Result<ApiGatewayResponse, HandlerError> {
    let event: ApiEvent = serde_json::from_value(event).map_err(HandlerError::MalformedEvent)?;

    let method = event.method();
    let path = event.path();

    let (pool, cold_start) = ensure_pool(pool_store, pacer)?;

    let query_started = Instant::now();
    pacer.pause(QUERY_DELAY);
    let query_time_ms = round_to_hundredths(query_started.elapsed().as_secs_f64() * 1_000.0);

    tracing::info!(
        component = COMPONENT,
        event = "request_processed",
        demo_name = context.environment.demo_name.as_deref(),
        method = method.as_str(),
        path = path.as_str(),
        cold_start,
        query_time_ms
    );

    let body = ApiBody {
        message: "API request processed successfully!".to_string(),
        demo: API_DEMO.to_string(),
        request: RequestSummary {
            method,
            path,
            timestamp: context.timestamp.clone(),
        },
        data: sample_users(),
        performance: PoolPerformance {
            query_time_ms,
            connection_pool_active: pool.initialized,
            available_connections: pool.connections,
            max_connections: pool.max_connections,
            cold_start,
        },
        instance_info: context.environment.instance_info(),
        benefits: benefits(&API_BENEFITS),
    };

    let mut headers = cors_json_headers();
    let pool_status = if cold_start { "Initializing" } else { "Active" };
    headers.insert(POOL_STATUS_HEADER.to_string(), pool_status.to_string());

    json_response(200, Some(headers), &body)
}

/// Builds the pool on first use. Returns the pool and whether this call
/// performed the initialization.
fn ensure_pool(
    pool_store: &impl StateStore<PoolState>,
    pacer: &impl Pacer,
) -> Result<(PoolState, bool), HandlerError> {
    let mut initialized_now = false;
    let pool = pool_store
        .update(&mut |pool: &mut PoolState| {
            if pool.initialized {
                return;
            }
            tracing::info!(component = COMPONENT, event = "pool_initializing");
            pacer.pause(POOL_SETUP_DELAY);
            initialized_now = pool.initialize();
            tracing::info!(
                component = COMPONENT,
                event = "pool_initialized",
                connections = pool.connections
            );
        })
        .map_err(HandlerError::StateStore)?;

    Ok((pool, initialized_now))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::adapters::state_store::InMemoryStateStore;
    use crate::test_helpers::{response_body, sample_context, RecordingPacer};

    use super::*;

    struct BrokenStore;

    impl StateStore<PoolState> for BrokenStore {
        fn read(&self) -> Result<PoolState, String> {
            Err("store offline".to_string())
        }

        fn update(&self, _apply: &mut dyn FnMut(&mut PoolState)) -> Result<PoolState, String> {
            Err("store offline".to_string())
        }
    }

    #[test]
    fn only_first_call_reports_cold_start() {
        let store = InMemoryStateStore::new(PoolState::default());
        let pacer = RecordingPacer::new();
        let context = sample_context();

        let first = handle_api_event(json!({}), &context, &store, &pacer).expect("first call");
        let second = handle_api_event(json!({}), &context, &store, &pacer).expect("second call");
        let third = handle_api_event(json!({}), &context, &store, &pacer).expect("third call");

        assert_eq!(response_body(&first.body)["performance"]["cold_start"], true);
        assert_eq!(response_body(&second.body)["performance"]["cold_start"], false);
        assert_eq!(response_body(&third.body)["performance"]["cold_start"], false);

        let setup_pauses = pacer
            .pauses()
            .into_iter()
            .filter(|pause| *pause == POOL_SETUP_DELAY)
            .count();
        assert_eq!(setup_pauses, 1);
    }

    #[test]
    fn pool_header_tracks_initialization() {
        let store = InMemoryStateStore::new(PoolState::default());
        let pacer = RecordingPacer::new();
        let context = sample_context();

        let first = handle_api_event(json!({}), &context, &store, &pacer).expect("first call");
        let second = handle_api_event(json!({}), &context, &store, &pacer).expect("second call");

        let header = |response: &ApiGatewayResponse| {
            response
                .headers
                .as_ref()
                .and_then(|headers| headers.get(POOL_STATUS_HEADER).cloned())
        };
        assert_eq!(header(&first).as_deref(), Some("Initializing"));
        assert_eq!(header(&second).as_deref(), Some("Active"));
    }

    #[test]
    fn reports_pool_and_sample_records() {
        let store = InMemoryStateStore::new(PoolState::new(250));
        let response = handle_api_event(
            json!({ "httpMethod": "POST", "path": "/users" }),
            &sample_context(),
            &store,
            &RecordingPacer::new(),
        )
        .expect("call should succeed");
        let body = response_body(&response.body);

        assert_eq!(body["request"]["method"], "POST");
        assert_eq!(body["request"]["path"], "/users");
        assert_eq!(body["performance"]["connection_pool_active"], true);
        assert_eq!(body["performance"]["available_connections"], 10);
        assert_eq!(body["performance"]["max_connections"], 250);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["data"][0]["name"], "Alice");
        assert_eq!(body["instance_info"]["type"], "managed");
    }

    #[test]
    fn reads_function_url_request_shape() {
        let event: ApiEvent = serde_json::from_value(json!({
            "rawPath": "/orders",
            "requestContext": { "http": { "method": "DELETE" } }
        }))
        .expect("event should parse");

        assert_eq!(event.method(), "DELETE");
        assert_eq!(event.path(), "/orders");
    }

    #[test]
    fn non_string_request_fields_do_not_fail() {
        let response = handle_api_event(
            json!({ "httpMethod": "GET", "path": 42, "requestContext": "opaque" }),
            &sample_context(),
            &InMemoryStateStore::new(PoolState::default()),
            &RecordingPacer::new(),
        )
        .expect("non-string path should still be served");
        let body = response_body(&response.body);

        assert_eq!(response.status_code, 200);
        assert_eq!(body["request"]["method"], "GET");
        assert_eq!(body["request"]["path"], "42");
    }

    #[test]
    fn null_fields_fall_through_to_function_url_shape() {
        let event: ApiEvent = serde_json::from_value(json!({
            "httpMethod": null,
            "path": null,
            "rawPath": "/items",
            "requestContext": { "http": { "method": "PUT" } }
        }))
        .expect("event should parse");

        assert_eq!(event.method(), "PUT");
        assert_eq!(event.path(), "/items");
    }

    #[test]
    fn defaults_method_and_path() {
        let event = ApiEvent::default();
        assert_eq!(event.method(), "GET");
        assert_eq!(event.path(), "/");
    }

    #[test]
    fn surfaces_state_store_failure() {
        let error = handle_api_event(
            json!({}),
            &sample_context(),
            &BrokenStore,
            &RecordingPacer::new(),
        )
        .expect_err("broken store should fail");

        assert!(matches!(error, HandlerError::StateStore(message) if message == "store offline"));
    }
}
