//! Renders a [`StackDeclaration`] as a Terraform JSON configuration.
//!
//! Cross-resource wiring becomes `${...}` interpolations so Terraform resolves
//! the role ARN, function names and URLs at apply time.

use serde_json::{json, Map, Value};

use crate::stack::{
    FunctionResource, FunctionUrl, OutputValue, Reference, StackDeclaration, URL_PLACEHOLDER,
};

pub const AWS_PROVIDER_SOURCE: &str = "hashicorp/aws";
pub const AWS_PROVIDER_VERSION: &str = ">= 5.0";

/// Terraform identifiers use underscores where logical names use dashes.
pub fn terraform_identifier(logical_name: &str) -> String {
    logical_name.replace('-', "_")
}

pub fn interpolation(reference: &Reference) -> String {
    match reference {
        Reference::FunctionUrl(name) => format!(
            "${{aws_lambda_function_url.{}.function_url}}",
            terraform_identifier(name)
        ),
        Reference::FunctionName(name) => format!(
            "${{aws_lambda_function.{}.function_name}}",
            terraform_identifier(name)
        ),
    }
}

fn escape_literal(text: &str) -> String {
    text.replace("${", "$${").replace("%{", "%%{")
}

pub fn render_terraform_json(stack: &StackDeclaration) -> Value {
    let role_id = terraform_identifier(&stack.role.logical_name);
    let attachment_id = terraform_identifier(&stack.policy_attachment.logical_name);

    let mut functions = Map::new();
    for function in &stack.functions {
        functions.insert(
            terraform_identifier(&function.logical_name),
            render_function(function, &attachment_id),
        );
    }

    let mut urls = Map::new();
    for url in &stack.urls {
        urls.insert(terraform_identifier(&url.logical_name), render_url(url));
    }

    let mut outputs = Map::new();
    for output in &stack.outputs {
        outputs.insert(
            output.name.clone(),
            json!({ "value": render_output_value(&output.value) }),
        );
    }

    json!({
        "terraform": {
            "required_providers": {
                "aws": {
                    "source": AWS_PROVIDER_SOURCE,
                    "version": AWS_PROVIDER_VERSION,
                }
            }
        },
        "provider": {
            "aws": {
                "region": escape_literal(&stack.region),
            }
        },
        "resource": {
            "aws_iam_role": {
                role_id: {
                    "name": stack.role.logical_name,
                    "assume_role_policy": stack.role.trust_policy.to_string(),
                    "tags": stack.role.tags,
                }
            },
            "aws_iam_role_policy_attachment": {
                attachment_id: {
                    "role": format!("${{aws_iam_role.{}.name}}", terraform_identifier(&stack.policy_attachment.role)),
                    "policy_arn": stack.policy_attachment.policy_arn,
                }
            },
            "aws_lambda_function": functions,
            "aws_lambda_function_url": urls,
        },
        "output": outputs,
    })
}

fn render_function(function: &FunctionResource, attachment_id: &str) -> Value {
    json!({
        "function_name": function.logical_name,
        "role": format!("${{aws_iam_role.{}.arn}}", terraform_identifier(&function.role)),
        "runtime": function.runtime,
        "handler": function.entry_point,
        "filename": function.code_archive,
        "source_code_hash": format!("${{filebase64sha256(\"{}\")}}", function.code_archive),
        "timeout": function.timeout_seconds,
        "memory_size": function.memory_mb,
        "environment": {
            "variables": function.environment,
        },
        "tags": function.tags,
        "depends_on": [format!("aws_iam_role_policy_attachment.{attachment_id}")],
    })
}

fn render_url(url: &FunctionUrl) -> Value {
    json!({
        "function_name": format!(
            "${{aws_lambda_function.{}.function_name}}",
            terraform_identifier(&url.function)
        ),
        "authorization_type": url.authorization_type,
        "cors": {
            "allow_origins": url.cors.allow_origins,
            "allow_methods": url.cors.allow_methods,
            "allow_headers": url.cors.allow_headers,
            "max_age": url.cors.max_age,
        },
    })
}

fn render_output_value(value: &OutputValue) -> Value {
    match value {
        OutputValue::Literal(text) => Value::String(escape_literal(text)),
        OutputValue::Reference(reference) => Value::String(interpolation(reference)),
        OutputValue::Template {
            template,
            reference,
        } => Value::String(
            escape_literal(template).replace(URL_PLACEHOLDER, &interpolation(reference)),
        ),
        OutputValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, entry)| (key.clone(), render_output_value(entry)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::stack::declare_stack;

    use super::*;

    #[test]
    fn pins_provider_region() {
        let rendered = render_terraform_json(&declare_stack("ap-southeast-2"));
        assert_eq!(rendered["provider"]["aws"]["region"], "ap-southeast-2");
        assert_eq!(rendered["output"]["region"]["value"], "ap-southeast-2");
    }

    #[test]
    fn every_function_assumes_the_single_role() {
        let rendered = render_terraform_json(&declare_stack("us-east-1"));
        let roles = rendered["resource"]["aws_iam_role"]
            .as_object()
            .expect("role block should be an object");
        assert_eq!(roles.len(), 1);

        let functions = rendered["resource"]["aws_lambda_function"]
            .as_object()
            .expect("function block should be an object");
        assert_eq!(functions.len(), 3);
        for function in functions.values() {
            assert_eq!(function["role"], "${aws_iam_role.lambda_managed_role.arn}");
            assert_eq!(
                function["depends_on"][0],
                "aws_iam_role_policy_attachment.lambda_basic_execution"
            );
        }
    }

    #[test]
    fn trust_policy_is_an_embedded_json_string() {
        let rendered = render_terraform_json(&declare_stack("us-east-1"));
        let policy = rendered["resource"]["aws_iam_role"]["lambda_managed_role"]
            ["assume_role_policy"]
            .as_str()
            .expect("trust policy should be a string");
        let parsed: Value = serde_json::from_str(policy).expect("trust policy should parse");
        assert_eq!(
            parsed["Statement"][0]["Principal"]["Service"],
            "lambda.amazonaws.com"
        );
    }

    #[test]
    fn test_commands_interpolate_url_attributes() {
        let rendered = render_terraform_json(&declare_stack("us-east-1"));
        let commands = &rendered["output"]["test_commands"]["value"];
        assert_eq!(
            commands["data_processor_small"],
            "curl \"${aws_lambda_function_url.data_processor_url.function_url}?file_size=small\""
        );
        assert_eq!(
            commands["api_handler"],
            "curl ${aws_lambda_function_url.api_handler_url.function_url}"
        );
    }

    #[test]
    fn escapes_template_sequences_in_literals() {
        assert_eq!(escape_literal("a${b}%{c}"), "a$${b}%%{c}");
    }
}
