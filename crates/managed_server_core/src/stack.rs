//! Declarative description of the deployed stack.
//!
//! Everything here is desired state: one execution role, the basic execution
//! policy attachment, three functions and one public URL per function, plus the
//! named outputs an operator reads after provisioning. Only the region varies.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::contract::ValidationError;

pub const PROJECT_TAG: &str = "Lambda-Managed-Server";
pub const LAMBDA_RUNTIME: &str = "provided.al2023";
pub const LAMBDA_ENTRY_POINT: &str = "bootstrap";
pub const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";
pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
pub const PUBLIC_AUTHORIZATION: &str = "NONE";
pub const CORS_MAX_AGE_SECONDS: u32 = 3_600;
pub const URL_PLACEHOLDER: &str = "{url}";

const ROLE_NAME: &str = "lambda-managed-role";
const ATTACHMENT_NAME: &str = "lambda-basic-execution";
const MAX_TIMEOUT_SECONDS: u32 = 900;
const MIN_MEMORY_MB: u32 = 128;
const MAX_MEMORY_MB: u32 = 10_240;

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionRole {
    pub logical_name: String,
    pub trust_policy: Value,
    pub tags: Tags,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyAttachment {
    pub logical_name: String,
    pub role: String,
    pub policy_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionResource {
    pub logical_name: String,
    pub binary: String,
    pub runtime: String,
    pub entry_point: String,
    pub code_archive: String,
    pub role: String,
    pub timeout_seconds: u32,
    pub memory_mb: u32,
    pub environment: BTreeMap<String, String>,
    pub tags: Tags,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub max_age: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionUrl {
    pub logical_name: String,
    pub function: String,
    pub authorization_type: String,
    pub cors: CorsPolicy,
}

/// Attribute of a declared resource that is only known after provisioning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reference {
    FunctionUrl(String),
    FunctionName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputValue {
    Literal(String),
    Reference(Reference),
    /// Text containing [`URL_PLACEHOLDER`], substituted with the referenced value.
    Template {
        template: String,
        reference: Reference,
    },
    Map(BTreeMap<String, OutputValue>),
}

impl OutputValue {
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Reference(reference) | Self::Template { reference, .. } => vec![reference],
            Self::Map(entries) => entries.values().flat_map(Self::references).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackOutput {
    pub name: String,
    pub value: OutputValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackDeclaration {
    pub region: String,
    pub role: ExecutionRole,
    pub policy_attachment: PolicyAttachment,
    pub functions: Vec<FunctionResource>,
    pub urls: Vec<FunctionUrl>,
    pub outputs: Vec<StackOutput>,
}

impl StackDeclaration {
    pub fn function(&self, logical_name: &str) -> Option<&FunctionResource> {
        self.functions
            .iter()
            .find(|function| function.logical_name == logical_name)
    }

    pub fn urls_for(&self, function_logical_name: &str) -> Vec<&FunctionUrl> {
        self.urls
            .iter()
            .filter(|url| url.function == function_logical_name)
            .collect()
    }

    pub fn output(&self, name: &str) -> Option<&StackOutput> {
        self.outputs.iter().find(|output| output.name == name)
    }
}

struct FunctionBlueprint {
    logical_name: &'static str,
    output_prefix: &'static str,
    binary: &'static str,
    timeout_seconds: u32,
    memory_mb: u32,
    demo_name: &'static str,
    extra_environment: &'static [(&'static str, &'static str)],
    name_tag: &'static str,
    demo_tag: &'static str,
    url_methods: &'static [&'static str],
}

const FUNCTION_BLUEPRINTS: [FunctionBlueprint; 3] = [
    FunctionBlueprint {
        logical_name: "data-processor",
        output_prefix: "data_processor",
        binary: "data_processor_lambda",
        timeout_seconds: 900,
        memory_mb: 3_008,
        demo_name: "Data Processing Pipeline",
        extra_environment: &[],
        name_tag: "data-processor-managed",
        demo_tag: "Data Processing",
        url_methods: &["GET", "POST"],
    },
    FunctionBlueprint {
        logical_name: "api-handler",
        output_prefix: "api_handler",
        binary: "api_handler_lambda",
        timeout_seconds: 300,
        memory_mb: 2_048,
        demo_name: "API with Connection Pooling",
        extra_environment: &[("MAX_CONNECTIONS", "100")],
        name_tag: "api-handler-managed",
        demo_tag: "API Handler",
        url_methods: &["GET", "POST", "PUT", "DELETE"],
    },
    FunctionBlueprint {
        logical_name: "websocket-handler",
        output_prefix: "websocket_handler",
        binary: "websocket_lambda",
        timeout_seconds: 300,
        memory_mb: 1_024,
        demo_name: "WebSocket Handler",
        extra_environment: &[],
        name_tag: "websocket-handler-managed",
        demo_tag: "WebSocket",
        url_methods: &["GET", "POST"],
    },
];

/// Binaries that must be packaged before the stack can be applied.
pub fn lambda_binaries() -> Vec<&'static str> {
    FUNCTION_BLUEPRINTS
        .iter()
        .map(|blueprint| blueprint.binary)
        .collect()
}

pub fn code_archive_path(binary: &str) -> String {
    format!("dist/{binary}.zip")
}

pub fn declare_stack(region: impl Into<String>) -> StackDeclaration {
    let region = region.into();
    let role = ExecutionRole {
        logical_name: ROLE_NAME.to_string(),
        trust_policy: lambda_trust_policy(),
        tags: tags(&[
            ("Name", "lambda-managed-instances-role"),
            ("Project", PROJECT_TAG),
        ]),
    };

    let policy_attachment = PolicyAttachment {
        logical_name: ATTACHMENT_NAME.to_string(),
        role: role.logical_name.clone(),
        policy_arn: BASIC_EXECUTION_POLICY_ARN.to_string(),
    };

    let mut functions = Vec::with_capacity(FUNCTION_BLUEPRINTS.len());
    let mut urls = Vec::with_capacity(FUNCTION_BLUEPRINTS.len());
    for blueprint in &FUNCTION_BLUEPRINTS {
        let mut environment = BTreeMap::from([
            ("INSTANCE_TYPE".to_string(), "managed".to_string()),
            ("DEMO_NAME".to_string(), blueprint.demo_name.to_string()),
        ]);
        for (key, value) in blueprint.extra_environment {
            environment.insert(key.to_string(), value.to_string());
        }

        functions.push(FunctionResource {
            logical_name: blueprint.logical_name.to_string(),
            binary: blueprint.binary.to_string(),
            runtime: LAMBDA_RUNTIME.to_string(),
            entry_point: LAMBDA_ENTRY_POINT.to_string(),
            code_archive: code_archive_path(blueprint.binary),
            role: role.logical_name.clone(),
            timeout_seconds: blueprint.timeout_seconds,
            memory_mb: blueprint.memory_mb,
            environment,
            tags: tags(&[
                ("Name", blueprint.name_tag),
                ("Demo", blueprint.demo_tag),
                ("Project", PROJECT_TAG),
            ]),
        });

        urls.push(FunctionUrl {
            logical_name: format!("{}-url", blueprint.logical_name),
            function: blueprint.logical_name.to_string(),
            authorization_type: PUBLIC_AUTHORIZATION.to_string(),
            cors: CorsPolicy {
                allow_origins: vec!["*".to_string()],
                allow_methods: blueprint
                    .url_methods
                    .iter()
                    .map(|method| method.to_string())
                    .collect(),
                allow_headers: vec!["*".to_string()],
                max_age: CORS_MAX_AGE_SECONDS,
            },
        });
    }

    let outputs = declare_outputs(&region);

    StackDeclaration {
        region,
        role,
        policy_attachment,
        functions,
        urls,
        outputs,
    }
}

fn declare_outputs(region: &str) -> Vec<StackOutput> {
    let mut outputs = vec![StackOutput {
        name: "region".to_string(),
        value: OutputValue::Literal(region.to_string()),
    }];

    for blueprint in &FUNCTION_BLUEPRINTS {
        outputs.push(StackOutput {
            name: format!("{}_url", blueprint.output_prefix),
            value: OutputValue::Reference(url_reference(blueprint.logical_name)),
        });
    }
    for blueprint in &FUNCTION_BLUEPRINTS {
        outputs.push(StackOutput {
            name: format!("{}_function_name", blueprint.output_prefix),
            value: OutputValue::Reference(Reference::FunctionName(
                blueprint.logical_name.to_string(),
            )),
        });
    }

    let command = |template: &str, function: &str| OutputValue::Template {
        template: template.to_string(),
        reference: url_reference(function),
    };
    outputs.push(StackOutput {
        name: "test_commands".to_string(),
        value: OutputValue::Map(BTreeMap::from([
            (
                "data_processor_small".to_string(),
                command("curl \"{url}?file_size=small\"", "data-processor"),
            ),
            (
                "data_processor_large".to_string(),
                command("curl \"{url}?file_size=large\"", "data-processor"),
            ),
            ("api_handler".to_string(), command("curl {url}", "api-handler")),
            (
                "websocket_handler".to_string(),
                command("curl {url}", "websocket-handler"),
            ),
        ])),
    });

    outputs
}

fn url_reference(function_logical_name: &str) -> Reference {
    Reference::FunctionUrl(format!("{function_logical_name}-url"))
}

fn lambda_trust_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Effect": "Allow",
            "Principal": {
                "Service": LAMBDA_SERVICE_PRINCIPAL
            }
        }]
    })
}

fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn validate_stack(stack: &StackDeclaration) -> Result<(), ValidationError> {
    if stack.region.trim().is_empty() {
        return Err(ValidationError::new("region cannot be empty"));
    }

    if stack.policy_attachment.role != stack.role.logical_name {
        return Err(ValidationError::new(format!(
            "Policy attachment '{}' must target role '{}'",
            stack.policy_attachment.logical_name, stack.role.logical_name
        )));
    }

    if stack.functions.is_empty() {
        return Err(ValidationError::new("Stack must declare at least one function"));
    }

    let mut function_names = BTreeSet::new();
    for function in &stack.functions {
        if !function_names.insert(function.logical_name.as_str()) {
            return Err(ValidationError::new(format!(
                "Function '{}' is declared more than once",
                function.logical_name
            )));
        }
        if function.role != stack.role.logical_name {
            return Err(ValidationError::new(format!(
                "Function '{}' must use execution role '{}'",
                function.logical_name, stack.role.logical_name
            )));
        }
        if function.timeout_seconds == 0 || function.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(ValidationError::new(format!(
                "Function '{}' timeout must be within 1..={MAX_TIMEOUT_SECONDS} seconds",
                function.logical_name
            )));
        }
        if !(MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&function.memory_mb) {
            return Err(ValidationError::new(format!(
                "Function '{}' memory must be within {MIN_MEMORY_MB}..={MAX_MEMORY_MB} MB",
                function.logical_name
            )));
        }
        let bound_urls = stack.urls_for(&function.logical_name).len();
        if bound_urls != 1 {
            return Err(ValidationError::new(format!(
                "Function '{}' must have exactly one URL, found {bound_urls}",
                function.logical_name
            )));
        }
    }

    let mut url_names = BTreeSet::new();
    for url in &stack.urls {
        if !url_names.insert(url.logical_name.as_str()) {
            return Err(ValidationError::new(format!(
                "URL '{}' is declared more than once",
                url.logical_name
            )));
        }
        if !function_names.contains(url.function.as_str()) {
            return Err(ValidationError::new(format!(
                "URL '{}' binds undeclared function '{}'",
                url.logical_name, url.function
            )));
        }
        if url.cors.allow_methods.is_empty() {
            return Err(ValidationError::new(format!(
                "URL '{}' must allow at least one CORS method",
                url.logical_name
            )));
        }
    }

    let mut output_names = BTreeSet::new();
    for output in &stack.outputs {
        if !output_names.insert(output.name.as_str()) {
            return Err(ValidationError::new(format!(
                "Output '{}' is declared more than once",
                output.name
            )));
        }
        for reference in output.value.references() {
            let known = match reference {
                Reference::FunctionUrl(name) => url_names.contains(name.as_str()),
                Reference::FunctionName(name) => function_names.contains(name.as_str()),
            };
            if !known {
                return Err(ValidationError::new(format!(
                    "Output '{}' references undeclared resource {reference:?}",
                    output.name
                )));
            }
        }
    }

    Ok(())
}

/// Substitutes deployed attribute values into an output.
pub fn resolve_output(
    value: &OutputValue,
    lookup: &dyn Fn(&Reference) -> Option<String>,
) -> Result<Value, ValidationError> {
    let resolve_reference = |reference: &Reference| {
        lookup(reference).ok_or_else(|| {
            ValidationError::new(format!("No deployed value for {reference:?}"))
        })
    };

    match value {
        OutputValue::Literal(text) => Ok(Value::String(text.clone())),
        OutputValue::Reference(reference) => resolve_reference(reference).map(Value::String),
        OutputValue::Template {
            template,
            reference,
        } => {
            let resolved = resolve_reference(reference)?;
            Ok(Value::String(template.replace(URL_PLACEHOLDER, &resolved)))
        }
        OutputValue::Map(entries) => {
            let mut object = serde_json::Map::with_capacity(entries.len());
            for (key, entry) in entries {
                object.insert(key.clone(), resolve_output(entry, lookup)?);
            }
            Ok(Value::Object(object))
        }
    }
}
