use managed_server_core::contract::{
    benefits, ConnectionInfo, SessionCounters, WebSocketBody, WEBSOCKET_BENEFITS, WEBSOCKET_DEMO,
};
use managed_server_core::routes::{WebSocketRoute, MISSING_ROUTE};
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::state_store::StateStore;
use crate::config::InvocationContext;
use crate::error::HandlerError;
use crate::handlers::lenient_text;
use crate::handlers::response::{json_response, ApiGatewayResponse};

const COMPONENT: &str = "websocket_handler";
const MISSING_CONNECTION_ID: &str = "N/A";
const MISSING_MESSAGE: &str = "No message";
const EMPTY_BODY: &str = "{}";

#[derive(Debug, Default, Deserialize)]
pub struct WebSocketEvent {
    #[serde(rename = "requestContext", default)]
    pub request_context: Option<Value>,
    #[serde(default)]
    pub body: Option<Value>,
}

impl WebSocketEvent {
    pub fn route_key(&self) -> String {
        self.context_field("/routeKey")
            .unwrap_or_else(|| MISSING_ROUTE.to_string())
    }

    pub fn connection_id(&self) -> String {
        self.context_field("/connectionId")
            .unwrap_or_else(|| MISSING_CONNECTION_ID.to_string())
    }

    pub fn body(&self) -> String {
        lenient_text(self.body.as_ref()).unwrap_or_else(|| EMPTY_BODY.to_string())
    }

    fn context_field(&self, pointer: &str) -> Option<String> {
        lenient_text(
            self.request_context
                .as_ref()
                .and_then(|context| context.pointer(pointer)),
        )
    }
}

/// Result of one route: the text echoed back and the counters it left behind.
struct RouteOutcome {
    message: String,
    counters: SessionCounters,
}

pub fn handle_websocket_event(
    event: Value,
    context: &InvocationContext,
    sessions: &impl StateStore<SessionCounters>,
) -> Result<ApiGatewayResponse, HandlerError> {
    let event: WebSocketEvent =
        serde_json::from_value(event).map_err(HandlerError::MalformedEvent)?;
    let route = WebSocketRoute::from_route_key(&event.route_key());
    let connection_id = event.connection_id();
    let connection_id = connection_id.as_str();
    let timestamp = context.timestamp.as_str();

    let outcome = match &route {
        WebSocketRoute::Connect => handle_connect(connection_id, timestamp, sessions),
        WebSocketRoute::Disconnect => handle_disconnect(connection_id, timestamp, sessions),
        WebSocketRoute::Message => handle_message(&event.body(), timestamp, sessions),
        WebSocketRoute::Unknown(route_key) => handle_unknown(route_key, timestamp, sessions),
    }?;

    tracing::info!(
        component = COMPONENT,
        event = "route_handled",
        demo_name = context.environment.demo_name.as_deref(),
        route = route.route_key(),
        connection_id,
        active_connections = outcome.counters.active_connections,
        messages_processed = outcome.counters.messages_processed
    );

    let body = WebSocketBody {
        action: route.action().to_string(),
        message: outcome.message,
        demo: WEBSOCKET_DEMO.to_string(),
        connection_info: ConnectionInfo {
            connection_id: connection_id.to_string(),
            route: route.route_key().to_string(),
            timestamp: context.timestamp.clone(),
        },
        statistics: outcome.counters.statistics(),
        instance_info: context.environment.instance_info(),
        benefits: benefits(&WEBSOCKET_BENEFITS),
    };

    json_response(200, None, &body)
}

fn handle_connect(
    connection_id: &str,
    timestamp: &str,
    sessions: &impl StateStore<SessionCounters>,
) -> Result<RouteOutcome, HandlerError> {
    let counters = record(sessions, timestamp, SessionCounters::record_connect)?;
    Ok(RouteOutcome {
        message: format!("WebSocket connection established: {connection_id}"),
        counters,
    })
}

fn handle_disconnect(
    connection_id: &str,
    timestamp: &str,
    sessions: &impl StateStore<SessionCounters>,
) -> Result<RouteOutcome, HandlerError> {
    let counters = record(sessions, timestamp, SessionCounters::record_disconnect)?;
    Ok(RouteOutcome {
        message: format!("WebSocket connection closed: {connection_id}"),
        counters,
    })
}

fn handle_message(
    body: &str,
    timestamp: &str,
    sessions: &impl StateStore<SessionCounters>,
) -> Result<RouteOutcome, HandlerError> {
    let text = message_text(body)?;
    let counters = record(sessions, timestamp, SessionCounters::record_message)?;
    Ok(RouteOutcome {
        message: format!("Processed message: {text}"),
        counters,
    })
}

fn handle_unknown(
    route_key: &str,
    timestamp: &str,
    sessions: &impl StateStore<SessionCounters>,
) -> Result<RouteOutcome, HandlerError> {
    let counters = record(sessions, timestamp, |_| {})?;
    Ok(RouteOutcome {
        message: format!("Unknown route: {route_key}"),
        counters,
    })
}

fn record(
    sessions: &impl StateStore<SessionCounters>,
    timestamp: &str,
    change: impl Fn(&mut SessionCounters),
) -> Result<SessionCounters, HandlerError> {
    sessions
        .update(&mut |counters: &mut SessionCounters| {
            change(counters);
            counters.touch(timestamp);
        })
        .map_err(HandlerError::StateStore)
}

/// Extracts the `message` field of a JSON object body. An explicit `null`
/// counts as no message.
fn message_text(body: &str) -> Result<String, HandlerError> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|error| HandlerError::MalformedBody(error.to_string()))?;
    let Some(object) = parsed.as_object() else {
        return Err(HandlerError::MalformedBody(
            "message body must be a JSON object".to_string(),
        ));
    };

    Ok(lenient_text(object.get("message")).unwrap_or_else(|| MISSING_MESSAGE.to_string()))
}
