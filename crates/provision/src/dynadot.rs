use async_trait::async_trait;
use serde_json::{json, Map, Value};
use stackpilot_types::ProvisionOutcome;
use tracing::debug;

use crate::{
    adapter::value_text, naming::parse_domain, ApiClient, ProvisionAdapter, ProvisionContext,
};

const DYNADOT_API_URL: &str = "https://api.dynadot.com/api3.json";

/// Domain search and registration via the Dynadot JSON API.
///
/// Dynadot wraps every response in a command-specific root object with a
/// `ResponseCode`/`Status` success convention, so HTTP 200 alone never
/// means success. Registration only happens when DYNADOT_AUTO_REGISTER is
/// enabled; the default flow stops after the availability search and
/// returns a quote.
pub struct DynadotAdapter {
    client: ApiClient,
}

struct DomainSearch {
    status: u16,
    domain: String,
    available: bool,
    price: String,
}

impl DynadotAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn search(
        &self,
        api_key: &str,
        domain_name: &str,
    ) -> Result<DomainSearch, ProvisionOutcome> {
        let response = self
            .client
            .get_json(
                DYNADOT_API_URL,
                None,
                &[
                    ("key", api_key),
                    ("command", "search"),
                    ("domain0", domain_name),
                    ("show_price", "1"),
                    ("currency", "USD"),
                ],
            )
            .await;
        if !response.ok {
            return Err(ProvisionOutcome::failure(
                "dynadot",
                Some(response.status),
                response.body,
            ));
        }

        let payload = response_payload(&response.body, "SearchResponse");
        if !status_ok(payload) {
            return Err(ProvisionOutcome::failure(
                "dynadot",
                Some(response.status),
                error_message(payload, "Dynadot search rejected"),
            ));
        }

        let first = payload
            .and_then(|map| map.get("SearchResults"))
            .and_then(first_result)
            .filter(|map| !map.is_empty());
        let Some(first) = first else {
            return Err(ProvisionOutcome::failure(
                "dynadot",
                Some(response.status),
                "Dynadot returned no search result",
            ));
        };

        let available_text = value_text(first.get("Available")).trim().to_lowercase();
        let found_domain = value_text(first.get("DomainName")).trim().to_lowercase();
        Ok(DomainSearch {
            status: response.status,
            domain: if found_domain.is_empty() {
                domain_name.to_string()
            } else {
                found_domain
            },
            available: matches!(available_text.as_str(), "yes" | "true" | "1"),
            price: value_text(first.get("Price")).trim().to_string(),
        })
    }

    async fn register(
        &self,
        api_key: &str,
        domain_name: &str,
        years: u32,
    ) -> Result<u16, ProvisionOutcome> {
        let duration = years.max(1).to_string();
        let response = self
            .client
            .get_json(
                DYNADOT_API_URL,
                None,
                &[
                    ("key", api_key),
                    ("command", "register"),
                    ("domain", domain_name),
                    ("duration", duration.as_str()),
                ],
            )
            .await;
        if !response.ok {
            return Err(ProvisionOutcome::failure(
                "dynadot",
                Some(response.status),
                response.body,
            ));
        }

        let payload = response_payload(&response.body, "RegisterResponse");
        if !status_ok(payload) {
            return Err(ProvisionOutcome::failure(
                "dynadot",
                Some(response.status),
                error_message(payload, "Dynadot register rejected"),
            ));
        }
        Ok(response.status)
    }
}

#[async_trait]
impl ProvisionAdapter for DynadotAdapter {
    fn provider(&self) -> &'static str {
        "dynadot"
    }

    async fn provision(&self, context: &ProvisionContext) -> ProvisionOutcome {
        let api_key = context.settings.resolve("DYNADOT_API_KEY");
        let auto_register = context.settings.resolve_bool("DYNADOT_AUTO_REGISTER", false);
        let years = context.settings.resolve_u32("DYNADOT_REGISTRATION_YEARS", 1);

        if api_key.is_empty() {
            return ProvisionOutcome::failure(
                "dynadot",
                None,
                "Dynadot not configured. Required: DYNADOT_API_KEY",
            );
        }

        let domain = context.domain_name.trim().to_lowercase();
        if parse_domain(&domain).is_none() {
            return ProvisionOutcome::failure(
                "dynadot",
                None,
                "Invalid domain. Example: mydomain.com",
            );
        }

        let search = match self.search(&api_key, &domain).await {
            Ok(search) => search,
            Err(outcome) => return outcome,
        };
        if !search.available {
            return ProvisionOutcome::failure_with_data(
                "dynadot",
                Some(search.status),
                "Domain is not available for registration.",
                json!({"domain": search.domain, "available": false}),
            );
        }

        if !auto_register {
            debug!(domain = %search.domain, "Domain available, returning quote only");
            return ProvisionOutcome::success(
                "dynadot",
                search.status,
                search.domain.clone(),
                json!({
                    "domain": search.domain,
                    "planId": context.plan_id,
                    "available": true,
                    "quotedPrice": search.price,
                    "message": "Domain is available. Set DYNADOT_AUTO_REGISTER=true to place live registration orders.",
                }),
            );
        }

        match self.register(&api_key, &domain, years).await {
            Ok(status) => ProvisionOutcome::success(
                "dynadot",
                status,
                domain.clone(),
                json!({
                    "domain": domain,
                    "planId": context.plan_id,
                    "registered": true,
                    "years": years,
                    "message": "Domain registration completed via Dynadot API.",
                }),
            ),
            Err(outcome) => outcome,
        }
    }
}

/// The command-specific root object, e.g. `SearchResponse`.
fn response_payload<'a>(body: &'a Value, root_key: &str) -> Option<&'a Map<String, Value>> {
    body.as_object()?.get(root_key)?.as_object()
}

fn status_ok(payload: Option<&Map<String, Value>>) -> bool {
    let Some(payload) = payload else {
        return false;
    };
    let code = value_text(payload.get("ResponseCode"));
    let status = value_text(payload.get("Status")).trim().to_lowercase();
    code == "0" && status == "success"
}

fn error_message(payload: Option<&Map<String, Value>>, fallback: &str) -> String {
    let message = payload
        .map(|map| value_text(map.get("Error")))
        .unwrap_or_default();
    let message = message.trim();
    if message.is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

/// Search results nest one level deeper than the response root and may be
/// an object, a `SearchResult`-wrapped object, or a list.
fn first_result(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map) => match map.get("SearchResult") {
            Some(inner) => first_result(inner),
            None => Some(map),
        },
        Value::Array(items) => items.first().and_then(Value::as_object),
        _ => None,
    }
}
