use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Uniform result of one upstream provider call.
///
/// `status` is the HTTP status, `0` when the call never produced a
/// response (DNS failure, refused connection, timeout). `body` is the
/// parsed JSON body; a non-JSON body is wrapped as `{"raw": <text>}` and
/// a transport fault carries the error message as a plain string.
#[derive(Debug, Clone)]
pub struct ApiOutcome {
    pub ok: bool,
    pub status: u16,
    pub body: Value,
}

/// Thin JSON client shared by every provider adapter.
///
/// Every call is bounded by one timeout and never returns a transport
/// error to the caller; faults collapse into an `ApiOutcome` so adapters
/// handle exactly one shape.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    pub async fn get_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
    ) -> ApiOutcome {
        let mut request = self.http.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        self.execute(url, request).await
    }

    pub async fn post_json(&self, url: &str, bearer: &str, payload: &Value) -> ApiOutcome {
        let request = self.http.post(url).bearer_auth(bearer).json(payload);
        self.execute(url, request).await
    }

    async fn execute(&self, url: &str, request: reqwest::RequestBuilder) -> ApiOutcome {
        let response = match request.timeout(self.timeout).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(url, error = %error, "Provider call failed in transport");
                return ApiOutcome {
                    ok: false,
                    status: 0,
                    body: Value::String(error.to_string()),
                };
            }
        };

        let status = response.status().as_u16();
        let ok = response.status().is_success();
        let raw = response.text().await.unwrap_or_default();
        debug!(url, status, ok, "Provider call completed");
        ApiOutcome {
            ok,
            status,
            body: parse_body(raw),
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a response body leniently: empty becomes `{}`, invalid JSON is
/// kept verbatim under a `raw` key.
fn parse_body(raw: String) -> Value {
    if raw.is_empty() {
        return json!({});
    }
    match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(_) => json!({ "raw": raw }),
    }
}
