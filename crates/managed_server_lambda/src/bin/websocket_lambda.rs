use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use managed_server_core::contract::SessionCounters;
use managed_server_lambda::adapters::state_store::InMemoryStateStore;
use managed_server_lambda::config::{InvocationContext, RuntimeEnvironment};
use managed_server_lambda::handlers::response::ApiGatewayResponse;
use managed_server_lambda::handlers::websocket::handle_websocket_event;
use managed_server_lambda::logging::init_logging;

async fn handle_request(
    event: LambdaEvent<serde_json::Value>,
    sessions: Arc<InMemoryStateStore<SessionCounters>>,
) -> Result<ApiGatewayResponse, Error> {
    let context = InvocationContext::now(RuntimeEnvironment::from_env());
    Ok(handle_websocket_event(
        event.payload,
        &context,
        sessions.as_ref(),
    )?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    // Counters are per execution environment; concurrent environments do
    // not share them.
    let sessions = Arc::new(InMemoryStateStore::new(SessionCounters::default()));

    lambda_runtime::run(service_fn(move |event| {
        let sessions = Arc::clone(&sessions);
        async move { handle_request(event, sessions).await }
    }))
    .await
}
