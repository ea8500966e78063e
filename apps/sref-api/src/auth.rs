//! Transport-level identity: bearer tokens and the `X-SREF-User-Id` header.

use axum::{
	extract::{FromRequestParts, Request, State},
	http::{HeaderMap, StatusCode, header, request::Parts},
	middleware::Next,
	response::{IntoResponse, Response},
};
use uuid::Uuid;

use sref_service::Requester;

use crate::{
	routes::{ApiError, json_error},
	state::AppState,
};

pub const USER_ID_HEADER: &str = "X-SREF-User-Id";

/// Marks a request that came through the admin listener with a valid admin token.
#[derive(Clone, Copy, Debug)]
pub struct Operator;

/// The caller as described by request headers. The service verifies it against storage.
#[derive(Clone, Debug)]
pub struct RequestContext(pub Requester);
impl<S> FromRequestParts<S> for RequestContext
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let user_id = match header_str(&parts.headers, USER_ID_HEADER) {
			None => None,
			Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
				json_error(
					StatusCode::UNPROCESSABLE_ENTITY,
					"INVALID_REQUEST",
					format!("{USER_ID_HEADER} must be a UUID."),
					Some(vec![format!("$.headers.{USER_ID_HEADER}")]),
				)
			})?),
		};
		let ip = header_str(&parts.headers, "x-forwarded-for")
			.and_then(|value| value.split(',').next())
			.map(|value| value.trim().to_string())
			.or_else(|| header_str(&parts.headers, "x-real-ip").map(str::to_string));

		Ok(Self(Requester {
			user_id,
			ip,
			user_agent: header_str(&parts.headers, header::USER_AGENT.as_str()).map(str::to_string),
			operator: parts.extensions.get::<Operator>().is_some(),
		}))
	}
}

/// Rejects requests without the configured API bearer token. A no-op when none is configured.
pub async fn require_api_token(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	match state.service.cfg.security.api_auth_token.as_deref() {
		Some(expected) if bearer(request.headers()) != Some(expected) => unauthenticated(),
		_ => next.run(request).await,
	}
}

/// Admin listener guard. Every request that passes is treated as an operator.
pub async fn require_admin_token(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Response {
	if let Some(expected) = state.service.cfg.security.admin_auth_token.as_deref()
		&& bearer(request.headers()) != Some(expected)
	{
		return unauthenticated();
	}

	request.extensions_mut().insert(Operator);

	next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
	header_str(headers, header::AUTHORIZATION.as_str())?.strip_prefix("Bearer ").map(str::trim)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get(name)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
}

fn unauthenticated() -> Response {
	json_error(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "A valid bearer token is required.", None)
		.into_response()
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	#[test]
	fn bearer_token_is_extracted() {
		let mut headers = HeaderMap::new();

		assert_eq!(bearer(&headers), None);

		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret "));

		assert_eq!(bearer(&headers), Some("secret"));

		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic c2VjcmV0"));

		assert_eq!(bearer(&headers), None);
	}
}
