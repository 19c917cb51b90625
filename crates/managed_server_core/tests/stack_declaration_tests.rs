use std::collections::BTreeMap;

use managed_server_core::stack::{
    declare_stack, lambda_binaries, resolve_output, validate_stack, OutputValue, Reference,
    BASIC_EXECUTION_POLICY_ARN, LAMBDA_ENTRY_POINT, LAMBDA_RUNTIME,
};
use managed_server_core::terraform::render_terraform_json;
use serde_json::Value;

fn deployed_values() -> BTreeMap<Reference, String> {
    BTreeMap::from([
        (
            Reference::FunctionUrl("data-processor-url".to_string()),
            "https://dp.lambda-url.us-east-1.on.aws/".to_string(),
        ),
        (
            Reference::FunctionUrl("api-handler-url".to_string()),
            "https://api.lambda-url.us-east-1.on.aws/".to_string(),
        ),
        (
            Reference::FunctionUrl("websocket-handler-url".to_string()),
            "https://ws.lambda-url.us-east-1.on.aws/".to_string(),
        ),
        (
            Reference::FunctionName("data-processor".to_string()),
            "data-processor".to_string(),
        ),
        (
            Reference::FunctionName("api-handler".to_string()),
            "api-handler".to_string(),
        ),
        (
            Reference::FunctionName("websocket-handler".to_string()),
            "websocket-handler".to_string(),
        ),
    ])
}

#[test]
fn one_role_is_shared_by_all_functions() {
    let stack = declare_stack("us-east-1");

    assert_eq!(stack.functions.len(), 3);
    assert!(stack
        .functions
        .iter()
        .all(|function| function.role == stack.role.logical_name));
    assert_eq!(stack.policy_attachment.role, stack.role.logical_name);
    assert_eq!(stack.policy_attachment.policy_arn, BASIC_EXECUTION_POLICY_ARN);
}

#[test]
fn each_function_has_exactly_one_url_with_declared_methods() {
    let stack = declare_stack("us-east-1");
    let expected_methods = [
        ("data-processor", vec!["GET", "POST"]),
        ("api-handler", vec!["GET", "POST", "PUT", "DELETE"]),
        ("websocket-handler", vec!["GET", "POST"]),
    ];

    for (function, methods) in expected_methods {
        let urls = stack.urls_for(function);
        assert_eq!(urls.len(), 1, "function {function}");
        let cors = &urls[0].cors;
        assert_eq!(cors.allow_methods, methods, "function {function}");
        assert_eq!(cors.allow_origins, vec!["*"]);
        assert_eq!(cors.allow_headers, vec!["*"]);
        assert_eq!(cors.max_age, 3_600);
        assert_eq!(urls[0].authorization_type, "NONE");
    }
}

#[test]
fn functions_carry_declared_limits_and_environment() {
    let stack = declare_stack("us-east-1");

    let data_processor = stack.function("data-processor").expect("data processor");
    assert_eq!(data_processor.timeout_seconds, 900);
    assert_eq!(data_processor.memory_mb, 3_008);
    assert_eq!(data_processor.runtime, LAMBDA_RUNTIME);
    assert_eq!(data_processor.entry_point, LAMBDA_ENTRY_POINT);
    assert_eq!(data_processor.code_archive, "dist/data_processor_lambda.zip");

    let api = stack.function("api-handler").expect("api handler");
    assert_eq!(api.timeout_seconds, 300);
    assert_eq!(api.memory_mb, 2_048);
    assert_eq!(
        api.environment.get("MAX_CONNECTIONS").map(String::as_str),
        Some("100")
    );

    let websocket = stack.function("websocket-handler").expect("websocket handler");
    assert_eq!(websocket.memory_mb, 1_024);
    assert_eq!(
        websocket.environment.get("DEMO_NAME").map(String::as_str),
        Some("WebSocket Handler")
    );
    assert!(stack
        .functions
        .iter()
        .all(|function| function.tags.get("Project").map(String::as_str)
            == Some("Lambda-Managed-Server")));
}

#[test]
fn declares_seven_scalar_outputs_and_test_commands() {
    let stack = declare_stack("eu-central-1");
    let names: Vec<&str> = stack
        .outputs
        .iter()
        .map(|output| output.name.as_str())
        .collect();

    assert_eq!(
        names,
        vec![
            "region",
            "data_processor_url",
            "api_handler_url",
            "websocket_handler_url",
            "data_processor_function_name",
            "api_handler_function_name",
            "websocket_handler_function_name",
            "test_commands",
        ]
    );
    let scalar_outputs = stack
        .outputs
        .iter()
        .filter(|output| !matches!(output.value, OutputValue::Map(_)))
        .count();
    assert_eq!(scalar_outputs, 7);
}

#[test]
fn test_commands_resolve_against_deployed_urls() {
    let stack = declare_stack("us-east-1");
    let values = deployed_values();
    let lookup = |reference: &Reference| values.get(reference).cloned();

    let commands = resolve_output(
        &stack.output("test_commands").expect("test commands").value,
        &lookup,
    )
    .expect("commands should resolve");

    assert_eq!(
        commands["data_processor_small"],
        "curl \"https://dp.lambda-url.us-east-1.on.aws/?file_size=small\""
    );
    assert_eq!(
        commands["data_processor_large"],
        "curl \"https://dp.lambda-url.us-east-1.on.aws/?file_size=large\""
    );
    assert_eq!(
        commands["api_handler"],
        "curl https://api.lambda-url.us-east-1.on.aws/"
    );
    assert_eq!(
        commands["websocket_handler"],
        "curl https://ws.lambda-url.us-east-1.on.aws/"
    );

    let region = resolve_output(&stack.output("region").expect("region").value, &lookup)
        .expect("region should resolve");
    assert_eq!(region, Value::from("us-east-1"));
}

#[test]
fn rendered_urls_bind_their_functions() {
    let stack = declare_stack("us-west-2");
    validate_stack(&stack).expect("stack should validate");
    let rendered = render_terraform_json(&stack);

    let urls = rendered["resource"]["aws_lambda_function_url"]
        .as_object()
        .expect("url block should be an object");
    assert_eq!(urls.len(), 3);
    assert_eq!(
        urls["api_handler_url"]["function_name"],
        "${aws_lambda_function.api_handler.function_name}"
    );
    assert_eq!(
        urls["api_handler_url"]["cors"]["allow_methods"],
        serde_json::json!(["GET", "POST", "PUT", "DELETE"])
    );
}

#[test]
fn packaged_binaries_match_function_archives() {
    let stack = declare_stack("us-east-1");
    let binaries = lambda_binaries();
    assert_eq!(binaries.len(), stack.functions.len());
    for function in &stack.functions {
        assert!(binaries.iter().any(|binary| *binary == function.binary));
    }
}
