use lambda_runtime::{service_fn, Error, LambdaEvent};
use managed_server_lambda::adapters::pacer::BlockingPacer;
use managed_server_lambda::config::{InvocationContext, RuntimeEnvironment};
use managed_server_lambda::handlers::data_processor::handle_data_processing_event;
use managed_server_lambda::handlers::response::ApiGatewayResponse;
use managed_server_lambda::logging::init_logging;

async fn handle_request(
    event: LambdaEvent<serde_json::Value>,
) -> Result<ApiGatewayResponse, Error> {
    let context = InvocationContext::now(RuntimeEnvironment::from_env());
    Ok(handle_data_processing_event(
        event.payload,
        &context,
        &BlockingPacer,
    )?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();
    lambda_runtime::run(service_fn(handle_request)).await
}
