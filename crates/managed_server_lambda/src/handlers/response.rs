use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::HandlerError;

pub type Headers = BTreeMap<String, String>;

/// Proxy-style response understood by function URLs and API Gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    pub body: String,
}

pub fn cors_json_headers() -> Headers {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
    ])
}

pub fn json_response(
    status_code: u16,
    headers: Option<Headers>,
    payload: &impl Serialize,
) -> Result<ApiGatewayResponse, HandlerError> {
    Ok(ApiGatewayResponse {
        status_code,
        headers,
        body: serde_json::to_string(payload)?,
    })
}
