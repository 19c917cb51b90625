use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use managed_server_core::contract::PoolState;
use managed_server_lambda::adapters::pacer::BlockingPacer;
use managed_server_lambda::adapters::state_store::InMemoryStateStore;
use managed_server_lambda::config::{InvocationContext, RuntimeEnvironment};
use managed_server_lambda::handlers::api::handle_api_event;
use managed_server_lambda::handlers::response::ApiGatewayResponse;
use managed_server_lambda::logging::init_logging;

async fn handle_request(
    event: LambdaEvent<serde_json::Value>,
    environment: RuntimeEnvironment,
    pool: Arc<InMemoryStateStore<PoolState>>,
) -> Result<ApiGatewayResponse, Error> {
    let context = InvocationContext::now(environment);
    Ok(handle_api_event(
        event.payload,
        &context,
        pool.as_ref(),
        &BlockingPacer,
    )?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    // The pool lives as long as the execution environment, so only the
    // first invocation served by it pays the setup cost.
    let environment = RuntimeEnvironment::from_env();
    let pool = Arc::new(InMemoryStateStore::new(PoolState::new(
        environment.max_connections,
    )));

    lambda_runtime::run(service_fn(move |event| {
        let environment = environment.clone();
        let pool = Arc::clone(&pool);
        async move { handle_request(event, environment, pool).await }
    }))
    .await
}
