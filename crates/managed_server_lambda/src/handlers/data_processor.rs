use std::time::Instant;

use managed_server_core::contract::{
    benefits, round_to_hundredths, DataProcessingBody, ProcessingDetails,
    DATA_PROCESSING_BENEFITS, DATA_PROCESSING_DEMO,
};
use managed_server_core::workload::{ProcessingPlan, BATCH_INTERVAL, BATCH_SIZE};
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::pacer::Pacer;
use crate::config::{utc_timestamp, InvocationContext};
use crate::error::HandlerError;
use crate::handlers::lenient_text;
use crate::handlers::response::{cors_json_headers, json_response, ApiGatewayResponse};

const COMPONENT: &str = "data_processor";

#[derive(Debug, Default, Deserialize)]
pub struct DataProcessingEvent {
    #[serde(rename = "queryStringParameters", default)]
    pub query_string_parameters: Option<Value>,
}

impl DataProcessingEvent {
    /// Non-string values are kept as their JSON text and run the default plan.
    pub fn file_size(&self) -> Option<String> {
        lenient_text(
            self.query_string_parameters
                .as_ref()
                .and_then(|parameters| parameters.get("file_size")),
        )
    }
}

pub fn handle_data_processing_event(
    event: Value,
    context: &InvocationContext,
    pacer: &impl Pacer,
) -> Result<ApiGatewayResponse, HandlerError> {
    let event: DataProcessingEvent =
        serde_json::from_value(event).map_err(HandlerError::MalformedEvent)?;
    let started_at = Instant::now();
    let plan = ProcessingPlan::for_request(event.file_size().as_deref());

    tracing::info!(
        component = COMPONENT,
        event = "processing_started",
        demo_name = context.environment.demo_name.as_deref(),
        file_size = %plan.requested_size,
        batches = plan.batches
    );

    let records_processed = run_batches(&plan, pacer);
    let execution_time_seconds = round_to_hundredths(started_at.elapsed().as_secs_f64());
    let completed_at = utc_timestamp();

    tracing::info!(
        component = COMPONENT,
        event = "processing_completed",
        records_processed,
        execution_time_seconds
    );

    let environment = &context.environment;
    let body = DataProcessingBody {
        message: "Data processing completed successfully!".to_string(),
        demo: DATA_PROCESSING_DEMO.to_string(),
        details: ProcessingDetails {
            file_size: plan.requested_size,
            records_processed,
            execution_time_seconds,
            timestamp: completed_at,
            instance_type: environment.instance_type.clone(),
            memory_mb: environment.memory_mb.clone(),
            function_name: environment.function_name.clone(),
        },
        benefits: benefits(&DATA_PROCESSING_BENEFITS),
    };

    json_response(200, Some(cors_json_headers()), &body)
}

fn run_batches(plan: &ProcessingPlan, pacer: &impl Pacer) -> u64 {
    let mut records_processed = 0u64;
    for batch in 1..=plan.batches {
        pacer.pause(BATCH_INTERVAL);
        records_processed += BATCH_SIZE;
        tracing::debug!(
            component = COMPONENT,
            event = "batch_processed",
            batch,
            records_processed
        );
    }
    records_processed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_helpers::{response_body, sample_context, RecordingPacer};

    use super::*;

    fn run(event: Value) -> (ApiGatewayResponse, RecordingPacer) {
        let pacer = RecordingPacer::new();
        let response = handle_data_processing_event(event, &sample_context(), &pacer)
            .expect("data processing should succeed");
        (response, pacer)
    }

    #[test]
    fn records_scale_with_requested_size() {
        let cases = [
            ("small", 2_000),
            ("medium", 5_000),
            ("large", 10_000),
            ("enormous", 5_000),
        ];

        for (size, expected_records) in cases {
            let (response, pacer) = run(json!({
                "queryStringParameters": { "file_size": size }
            }));
            let body = response_body(&response.body);

            assert_eq!(body["details"]["records_processed"], expected_records);
            assert_eq!(body["details"]["file_size"], size);
            assert_eq!(
                pacer.pauses().len() as u64,
                expected_records / BATCH_SIZE,
                "size {size}"
            );
        }
    }

    #[test]
    fn missing_or_null_parameters_use_medium() {
        for event in [json!({}), json!({ "queryStringParameters": null })] {
            let (response, pacer) = run(event);
            let body = response_body(&response.body);

            assert_eq!(body["details"]["file_size"], "medium");
            assert_eq!(body["details"]["records_processed"], 5_000);
            assert_eq!(pacer.total_paused(), BATCH_INTERVAL * 5);
        }
    }

    #[test]
    fn response_carries_cors_headers_and_static_metadata() {
        let (response, _) = run(json!({ "queryStringParameters": { "file_size": "small" } }));

        assert_eq!(response.status_code, 200);
        let headers = response.headers.expect("headers should be set");
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");

        let body = response_body(&response.body);
        assert_eq!(body["message"], "Data processing completed successfully!");
        assert_eq!(body["demo"], DATA_PROCESSING_DEMO);
        assert_eq!(body["details"]["instance_type"], "managed");
        assert_eq!(body["details"]["memory_mb"], "1024");
        assert_eq!(body["details"]["function_name"], "local-function");
        assert_eq!(body["benefits"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn non_string_file_size_runs_medium_plan() {
        let (response, pacer) = run(json!({ "queryStringParameters": { "file_size": 5 } }));
        let body = response_body(&response.body);

        assert_eq!(response.status_code, 200);
        assert_eq!(body["details"]["file_size"], "5");
        assert_eq!(body["details"]["records_processed"], 5_000);
        assert_eq!(pacer.pauses().len(), 5);
    }

    #[test]
    fn ignores_unrelated_non_string_parameters() {
        let (response, _) = run(json!({
            "queryStringParameters": { "file_size": "small", "page": 2, "debug": true }
        }));
        let body = response_body(&response.body);

        assert_eq!(body["details"]["file_size"], "small");
        assert_eq!(body["details"]["records_processed"], 2_000);
    }

    #[test]
    fn null_file_size_uses_medium() {
        let (response, _) = run(json!({ "queryStringParameters": { "file_size": null } }));
        assert_eq!(response_body(&response.body)["details"]["file_size"], "medium");
    }

    #[test]
    fn timestamp_marks_completion_not_invocation_start() {
        let context = sample_context();
        let response = handle_data_processing_event(
            json!({ "queryStringParameters": { "file_size": "small" } }),
            &context,
            &RecordingPacer::new(),
        )
        .expect("data processing should succeed");
        let body = response_body(&response.body);
        let timestamp = body["details"]["timestamp"]
            .as_str()
            .expect("timestamp should be a string");

        assert_ne!(timestamp, context.timestamp);
        assert!(timestamp.ends_with('Z'));
    }

    #[test]
    fn rejects_non_object_event() {
        let error = handle_data_processing_event(
            json!("not-an-event"),
            &sample_context(),
            &RecordingPacer::new(),
        )
        .expect_err("string event should fail");

        assert!(matches!(error, HandlerError::MalformedEvent(_)));
    }
}
