use axum::http::HeaderMap;
use stackpilot_config::SettingsResolver;

use crate::error::ApiError;

/// Privilege tiers, lowest first. Ordering is the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Viewer,
    Admin,
    Owner,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

/// The caller's established identity for one request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub username: String,
    pub role: Role,
}

/// Resolve the caller against the configured ADMIN_API_TOKEN. The token
/// may arrive as `X-Admin-Token` or as a bearer credential; a match
/// grants the top role. No token configured means nobody authenticates.
pub fn authorize(headers: &HeaderMap, settings: &SettingsResolver) -> Option<AuthContext> {
    let configured = settings.resolve("ADMIN_API_TOKEN");
    let provided = extract_admin_token(headers);
    if !configured.is_empty() && !provided.is_empty() && constant_time_eq(&configured, &provided) {
        return Some(AuthContext {
            username: "token-admin".to_string(),
            role: Role::Owner,
        });
    }
    None
}

/// Gate for privileged routes: 401 when the caller has no identity, 403
/// when the identity sits below the required tier.
pub fn require_role(
    headers: &HeaderMap,
    settings: &SettingsResolver,
    minimum: Role,
) -> Result<AuthContext, ApiError> {
    let auth = authorize(headers, settings).ok_or(ApiError::Unauthorized)?;
    if auth.role < minimum {
        return Err(ApiError::Forbidden {
            role: minimum.name(),
        });
    }
    Ok(auth)
}

/// `X-Admin-Token` wins over an `Authorization: Bearer` credential.
fn extract_admin_token(headers: &HeaderMap) -> String {
    let explicit = header_text(headers, "x-admin-token");
    let explicit = explicit.trim();
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    extract_bearer_token(headers)
}

fn extract_bearer_token(headers: &HeaderMap) -> String {
    let auth = header_text(headers, "authorization");
    let is_bearer = auth
        .get(..7)
        .map(|prefix| prefix.eq_ignore_ascii_case("bearer "))
        .unwrap_or(false);
    if is_bearer {
        auth[7..].trim().to_string()
    } else {
        String::new()
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackpilot_config::OverrideStore;
    use std::collections::HashMap;

    fn resolver_with_token(token: &str) -> SettingsResolver {
        let mut vars = HashMap::new();
        vars.insert("ADMIN_API_TOKEN".to_string(), token.to_string());
        SettingsResolver::with_snapshot(vars, OverrideStore::memory())
    }

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        headers
    }

    #[test]
    fn admin_header_authenticates() {
        let settings = resolver_with_token("seabreeze-token");
        let headers = headers_with("x-admin-token", "seabreeze-token");
        let auth = authorize(&headers, &settings).unwrap();
        assert_eq!(auth.role, Role::Owner);
        assert_eq!(auth.username, "token-admin");
    }

    #[test]
    fn bearer_credential_is_accepted_as_fallback() {
        let settings = resolver_with_token("seabreeze-token");
        let headers = headers_with("authorization", "Bearer seabreeze-token");
        assert!(authorize(&headers, &settings).is_some());

        let mixed_case = headers_with("authorization", "bEaReR seabreeze-token");
        assert!(authorize(&mixed_case, &settings).is_some());
    }

    #[test]
    fn explicit_header_wins_over_bearer() {
        let settings = resolver_with_token("right");
        let mut headers = headers_with("x-admin-token", "wrong");
        headers.insert("authorization", "Bearer right".parse().unwrap());
        // the explicit header is compared, and it does not match
        assert!(authorize(&headers, &settings).is_none());
    }

    #[test]
    fn wrong_or_missing_token_fails() {
        let settings = resolver_with_token("expected");
        assert!(authorize(&HeaderMap::new(), &settings).is_none());
        let headers = headers_with("x-admin-token", "other");
        assert!(authorize(&headers, &settings).is_none());
    }

    #[test]
    fn unconfigured_token_rejects_everyone() {
        let settings =
            SettingsResolver::with_snapshot(HashMap::new(), OverrideStore::memory());
        let headers = headers_with("x-admin-token", "anything");
        assert!(authorize(&headers, &settings).is_none());
    }

    #[test]
    fn require_role_maps_to_the_gate_errors() {
        let settings = resolver_with_token("tok");
        let error = require_role(&HeaderMap::new(), &settings, Role::Admin).unwrap_err();
        assert_eq!(error.to_string(), "Unauthorized. Sign in first.");

        let headers = headers_with("x-admin-token", "tok");
        let auth = require_role(&headers, &settings, Role::Admin).unwrap();
        assert_eq!(auth.role, Role::Owner);
    }

    #[test]
    fn role_ordering_matches_the_hierarchy() {
        assert!(Role::Viewer < Role::Admin);
        assert!(Role::Admin < Role::Owner);
    }
}
