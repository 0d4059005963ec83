use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use storefront_core::{Principal, Role};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The resolved caller for a request, stored as a request extension.
///
/// Always present once [`resolve_principal`] has run; `None` means the request
/// carried no bearer token or one that matched no configured key.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Principal>);

#[derive(Debug, Clone)]
struct ApiKey {
    token: String,
    principal: Principal,
}

/// Bearer-key to principal mapping used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Arc<Vec<ApiKey>>,
}

impl AuthState {
    /// Builds auth config from `STOREFRONT_ADMIN_KEYS` and
    /// `STOREFRONT_CLIENT_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, missing admin keys only log a warning: reads still work
    /// and every write is rejected. Outside development, missing admin keys
    /// fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        Self::from_lookup(is_development, |var| std::env::var(var).ok())
    }

    fn from_lookup<F>(is_development: bool, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin = split_keys(lookup("STOREFRONT_ADMIN_KEYS").as_deref());
        let client = split_keys(lookup("STOREFRONT_CLIENT_KEYS").as_deref());

        if admin.is_empty() {
            if !is_development {
                anyhow::bail!(
                    "STOREFRONT_ADMIN_KEYS is required outside development; provide comma-separated bearer tokens"
                );
            }
            tracing::warn!("STOREFRONT_ADMIN_KEYS not set; catalog writes are disabled");
        }

        Ok(Self::from_keys(&admin, &client))
    }

    /// Builds auth config from explicit key lists.
    #[must_use]
    pub fn from_keys<S: AsRef<str>>(admin: &[S], client: &[S]) -> Self {
        let admin_keys = admin.iter().enumerate().map(|(i, token)| ApiKey {
            token: token.as_ref().to_owned(),
            principal: Principal {
                subject_id: format!("admin-key-{}", i + 1),
                role: Role::Admin,
            },
        });
        let client_keys = client.iter().enumerate().map(|(i, token)| ApiKey {
            token: token.as_ref().to_owned(),
            principal: Principal {
                subject_id: format!("client-key-{}", i + 1),
                role: Role::Client,
            },
        });

        Self {
            keys: Arc::new(admin_keys.chain(client_keys).collect()),
        }
    }

    /// Looks up the principal for `token`. Every configured key is compared
    /// in constant time.
    fn resolve(&self, token: &str) -> Option<Principal> {
        let mut found = None;
        for key in self.keys.iter() {
            let matches: bool = key.token.as_bytes().ct_eq(token.as_bytes()).into();
            if matches && found.is_none() {
                found = Some(key.principal.clone());
            }
        }
        found
    }
}

fn split_keys(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

/// Request id recorded by [`request_id`], or empty when that layer is absent.
fn current_request_id(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware resolving the bearer token into a [`Caller`].
///
/// A request without a token, or with a token that matches no configured key,
/// proceeds anonymously. Reads stay public; write handlers reject anonymous
/// callers.
pub async fn resolve_principal(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .and_then(|token| auth.resolve(token));

    if principal.is_none() && req.headers().contains_key(AUTHORIZATION) {
        tracing::debug!(
            request_id = %current_request_id(&req),
            "bearer token did not match a configured key; continuing anonymously"
        );
    }

    req.extensions_mut().insert(Caller(principal));
    next.run(req).await
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        drop(window);
        return ApiError::new(current_request_id(&req), "rate_limited", "rate limit exceeded")
            .into_response();
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_allows_missing_admin_keys_in_dev() {
        let state = AuthState::from_lookup(true, lookup_from(&[])).expect("dev should allow");
        assert!(state.resolve("anything").is_none());
    }

    #[test]
    fn auth_state_requires_admin_keys_outside_dev() {
        let result = AuthState::from_lookup(false, lookup_from(&[("STOREFRONT_CLIENT_KEYS", "c")]));
        assert!(result.is_err());
    }

    #[test]
    fn auth_state_maps_tokens_to_roles() {
        let state = AuthState::from_lookup(
            false,
            lookup_from(&[
                ("STOREFRONT_ADMIN_KEYS", "admin-1, admin-2"),
                ("STOREFRONT_CLIENT_KEYS", "shopper"),
            ]),
        )
        .expect("auth");

        let admin = state.resolve("admin-2").expect("admin principal");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.subject_id, "admin-key-2");

        let client = state.resolve("shopper").expect("client principal");
        assert_eq!(client.role, Role::Client);

        assert!(state.resolve("admin").is_none());
        assert!(state.resolve("").is_none());
    }
}
