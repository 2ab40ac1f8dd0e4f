use regex::Regex;
use serde_json::{Map, Value};
use stackpilot_orchestrator::ProvisionOptions;
use stackpilot_types::{NewRequestItem, NewServiceRequest, RequestStatus};
use std::sync::OnceLock;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static pattern"))
}

pub fn parse_json_body(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|_| "Invalid JSON payload".to_string())
}

/// Validate and shape an order submission. Item fields keep their raw
/// casing so the stored record mirrors what the customer sent; field
/// trimming happens at persistence time.
pub fn parse_new_request(body: &Value) -> Result<NewServiceRequest, String> {
    let map = as_object(body)?;

    let customer_name = require_text(map, "customerName", "customerName is required")?;
    let email = require_text(map, "email", "email is required")?;
    if !email_pattern().is_match(email.trim()) {
        return Err("email must be valid".to_string());
    }
    let project_name = require_text(map, "projectName", "projectName is required")?;

    let items = match map.get("items") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err("items must be a non-empty array".to_string()),
    };
    let mut parsed_items = Vec::with_capacity(items.len());
    for item in items {
        let item = item
            .as_object()
            .ok_or_else(|| "Each item must be an object".to_string())?;
        parsed_items.push(NewRequestItem {
            provider_id: require_text(item, "providerId", "Each item needs providerId")?,
            service_id: require_text(item, "serviceId", "Each item needs serviceId")?,
            plan_id: require_text(item, "planId", "Each item needs planId")?,
            billing_cycle: require_text(item, "billingCycle", "Each item needs billingCycle")?,
        });
    }

    let notes = match map.get("notes") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(notes)) => notes.clone(),
        Some(_) => return Err("notes must be text".to_string()),
    };

    Ok(NewServiceRequest {
        customer_name,
        email,
        project_name,
        notes,
        items: parsed_items,
    })
}

#[derive(Debug)]
pub struct ProvisionPayload {
    pub request_id: String,
    pub options: ProvisionOptions,
}

pub fn parse_provision(body: &Value) -> Result<ProvisionPayload, String> {
    let map = as_object(body)?;
    let request_id = require_text(map, "requestId", "requestId is required")?;
    let domain_name = optional_text(map, "domainName", "domainName must be text")?;
    let region = optional_text(map, "region", "region must be text")?;
    let db_password = optional_text(map, "dbPassword", "dbPassword must be text")?;
    let retry_failed = match map.get("retryFailed") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err("retryFailed must be true or false".to_string()),
    };

    Ok(ProvisionPayload {
        request_id: request_id.trim().to_string(),
        options: ProvisionOptions {
            domain_name,
            region,
            db_password,
            retry_failed,
        },
    })
}

#[derive(Debug)]
pub struct StatusPayload {
    pub request_id: String,
    pub status: RequestStatus,
    pub reason: String,
}

pub fn parse_status_update(body: &Value) -> Result<StatusPayload, String> {
    let map = as_object(body)?;
    let request_id = require_text(map, "requestId", "requestId is required")?;
    let status_text = require_text(map, "status", "status is required")?;
    let status = status_text.parse::<RequestStatus>().map_err(|_| {
        format!(
            "status must be one of: {}",
            RequestStatus::sorted_names().join(", ")
        )
    })?;
    let reason = match map.get("reason") {
        None | Some(Value::Null) => "manual update".to_string(),
        Some(Value::String(reason)) => {
            let trimmed = reason.trim();
            if trimmed.is_empty() {
                "manual update".to_string()
            } else {
                trimmed.to_string()
            }
        }
        Some(_) => return Err("reason must be text".to_string()),
    };

    Ok(StatusPayload {
        request_id: request_id.trim().to_string(),
        status,
        reason,
    })
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, String> {
    body.as_object()
        .ok_or_else(|| "Request body must be a JSON object".to_string())
}

fn require_text(map: &Map<String, Value>, key: &str, message: &str) -> Result<String, String> {
    match map.get(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(message.to_string()),
    }
}

fn optional_text(
    map: &Map<String, Value>,
    key: &str,
    message: &str,
) -> Result<Option<String>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_order() -> Value {
        json!({
            "customerName": "Jordan Blake",
            "email": "jordan@example.com",
            "projectName": "Island Breeze",
            "items": [
                {
                    "providerId": "render",
                    "serviceId": "managed-web-hosting",
                    "planId": "starter",
                    "billingCycle": "monthly",
                }
            ],
        })
    }

    #[test]
    fn valid_order_parses_with_raw_item_fields() {
        let mut body = valid_order();
        body["items"][0]["providerId"] = json!("Render");
        let parsed = parse_new_request(&body).unwrap();
        assert_eq!(parsed.customer_name, "Jordan Blake");
        assert_eq!(parsed.items[0].provider_id, "Render");
        assert_eq!(parsed.notes, "");
    }

    #[test]
    fn order_field_errors_use_the_exact_messages() {
        assert_eq!(
            parse_new_request(&json!([])).unwrap_err(),
            "Request body must be a JSON object"
        );

        let mut body = valid_order();
        body.as_object_mut().unwrap().remove("customerName");
        assert_eq!(parse_new_request(&body).unwrap_err(), "customerName is required");

        let mut body = valid_order();
        body["customerName"] = json!("   ");
        assert_eq!(parse_new_request(&body).unwrap_err(), "customerName is required");

        let mut body = valid_order();
        body["email"] = json!("not-an-email");
        assert_eq!(parse_new_request(&body).unwrap_err(), "email must be valid");

        let mut body = valid_order();
        body["email"] = json!("has space@example.com");
        assert_eq!(parse_new_request(&body).unwrap_err(), "email must be valid");

        let mut body = valid_order();
        body["items"] = json!([]);
        assert_eq!(
            parse_new_request(&body).unwrap_err(),
            "items must be a non-empty array"
        );

        let mut body = valid_order();
        body["items"] = json!(["bare string"]);
        assert_eq!(
            parse_new_request(&body).unwrap_err(),
            "Each item must be an object"
        );

        let mut body = valid_order();
        body["items"][0]["planId"] = json!("");
        assert_eq!(parse_new_request(&body).unwrap_err(), "Each item needs planId");

        let mut body = valid_order();
        body["notes"] = json!(42);
        assert_eq!(parse_new_request(&body).unwrap_err(), "notes must be text");
    }

    #[test]
    fn provision_payload_defaults_and_rejections() {
        let parsed = parse_provision(&json!({"requestId": " SRV-20260801-0001 "})).unwrap();
        assert_eq!(parsed.request_id, "SRV-20260801-0001");
        assert!(parsed.options.domain_name.is_none());
        assert!(!parsed.options.retry_failed);

        let full = parse_provision(&json!({
            "requestId": "SRV-20260801-0001",
            "domainName": "custom.dev",
            "retryFailed": true,
        }))
        .unwrap();
        assert_eq!(full.options.domain_name.as_deref(), Some("custom.dev"));
        assert!(full.options.retry_failed);

        assert_eq!(
            parse_provision(&json!({})).unwrap_err(),
            "requestId is required"
        );
        assert_eq!(
            parse_provision(&json!({"requestId": "x", "domainName": 5})).unwrap_err(),
            "domainName must be text"
        );
        assert_eq!(
            parse_provision(&json!({"requestId": "x", "retryFailed": "yes"})).unwrap_err(),
            "retryFailed must be true or false"
        );
    }

    #[test]
    fn status_payload_normalizes_and_validates_the_enum() {
        let parsed = parse_status_update(&json!({
            "requestId": "SRV-20260801-0001",
            "status": " Reviewing ",
        }))
        .unwrap();
        assert_eq!(parsed.status, RequestStatus::Reviewing);
        assert_eq!(parsed.reason, "manual update");

        let custom = parse_status_update(&json!({
            "requestId": "SRV-20260801-0001",
            "status": "on_hold",
            "reason": "  waiting on customer  ",
        }))
        .unwrap();
        assert_eq!(custom.reason, "waiting on customer");

        let error = parse_status_update(&json!({
            "requestId": "SRV-20260801-0001",
            "status": "destroyed",
        }))
        .unwrap_err();
        assert_eq!(
            error,
            "status must be one of: active, approved, cancelled, on_hold, partially_active, provision_failed, provisioning, reviewing, submitted"
        );

        assert_eq!(
            parse_status_update(&json!({"requestId": "x", "status": "active", "reason": 1}))
                .unwrap_err(),
            "reason must be text"
        );
    }

    #[test]
    fn body_parsing_rejects_invalid_json() {
        assert_eq!(parse_json_body("{").unwrap_err(), "Invalid JSON payload");
        assert_eq!(parse_json_body("").unwrap_err(), "Invalid JSON payload");
        assert!(parse_json_body("{\"a\": 1}").is_ok());
    }
}
