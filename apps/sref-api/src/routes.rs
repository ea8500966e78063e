use axum::{
	Json, Router,
	body::Bytes,
	extract::{Path, Query, State, rejection::JsonRejection},
	http::StatusCode,
	middleware,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use sref_service::{
	ApproveRequest, CatalogItemDetail, CategorySummary, Error as ServiceError,
	LifecycleResponse, RecomputeReport, RecordInteractionRequest, RecordInteractionResponse,
	SearchRequest, SearchResponse, SubmitItemRequest, SubmitItemResponse, TagSummary,
	TrendingResponse,
};

use crate::{
	auth::{self, RequestContext},
	state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
	pub limit: Option<i64>,
}

/// Public listener. Admin routes are mounted here too and require an ADMIN caller.
pub fn router(state: AppState) -> Router {
	let v1 = Router::new()
		.route("/v1/search", post(search))
		.route("/v1/trending", get(trending))
		.route("/v1/srefs", post(submit_item))
		.route("/v1/srefs/{code}", get(get_item).delete(delete_item))
		.route("/v1/srefs/{code}/events", post(record_interaction))
		.route("/v1/categories", get(list_categories))
		.route("/v1/tags", get(list_tags))
		.merge(admin_routes())
		.route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_token));

	Router::new().route("/health", get(health)).merge(v1).with_state(state)
}

/// Admin listener. Requests that pass the admin token check act as operators.
pub fn admin_router(state: AppState) -> Router {
	admin_routes()
		.route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin_token))
		.route("/health", get(health))
		.with_state(state)
}

fn admin_routes() -> Router<AppState> {
	Router::new()
		.route("/v1/admin/srefs/{code}/approve", post(approve_item))
		.route("/v1/admin/srefs/{code}/archive", post(archive_item))
		.route("/v1/admin/recompute", post(recompute))
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(&requester, json_body(payload)?).await?;

	Ok(Json(response))
}

async fn trending(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	Query(query): Query<LimitQuery>,
) -> Result<Json<TrendingResponse>, ApiError> {
	let response = state.service.trending(&requester, query.limit).await?;

	Ok(Json(response))
}

async fn get_item(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	Path(code): Path<String>,
) -> Result<Json<CatalogItemDetail>, ApiError> {
	let response = state.service.get_item(&requester, &code).await?;

	Ok(Json(response))
}

async fn submit_item(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	payload: Result<Json<SubmitItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitItemResponse>), ApiError> {
	let response = state.service.submit_item(&requester, json_body(payload)?).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn delete_item(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	Path(code): Path<String>,
) -> Result<Json<LifecycleResponse>, ApiError> {
	let response = state.service.delete_item(&requester, &code).await?;

	Ok(Json(response))
}

async fn record_interaction(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	Path(code): Path<String>,
	payload: Result<Json<RecordInteractionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordInteractionResponse>), ApiError> {
	let response =
		state.service.record_interaction(&requester, &code, json_body(payload)?).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn list_categories(
	State(state): State<AppState>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
	let response = state.service.list_categories().await?;

	Ok(Json(response))
}

async fn list_tags(
	State(state): State<AppState>,
	Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TagSummary>>, ApiError> {
	let response = state.service.list_tags(query.limit).await?;

	Ok(Json(response))
}

/// The body is optional; an empty body approves without touching curation flags.
async fn approve_item(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	Path(code): Path<String>,
	body: Bytes,
) -> Result<Json<LifecycleResponse>, ApiError> {
	let request = if body.iter().all(u8::is_ascii_whitespace) {
		ApproveRequest::default()
	} else {
		serde_json::from_slice(&body).map_err(|err| invalid_body(err.to_string()))?
	};
	let response = state.service.approve_item(&requester, &code, request).await?;

	Ok(Json(response))
}

async fn archive_item(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
	Path(code): Path<String>,
) -> Result<Json<LifecycleResponse>, ApiError> {
	let response = state.service.archive_item(&requester, &code).await?;

	Ok(Json(response))
}

async fn recompute(
	State(state): State<AppState>,
	RequestContext(requester): RequestContext,
) -> Result<Json<RecomputeReport>, ApiError> {
	let response = state.service.admin_recompute(&requester).await?;

	Ok(Json(response))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError>
where
	T: DeserializeOwned,
{
	payload.map(|Json(value)| value).map_err(|rejection| invalid_body(rejection.body_text()))
}

fn invalid_body(message: String) -> ApiError {
	json_error(
		StatusCode::UNPROCESSABLE_ENTITY,
		"INVALID_REQUEST",
		message,
		Some(vec!["$".to_string()]),
	)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { field, message } => json_error(
				StatusCode::UNPROCESSABLE_ENTITY,
				"INVALID_REQUEST",
				message,
				Some(vec![field]),
			),
			ServiceError::Unauthorized { message } =>
				json_error(StatusCode::FORBIDDEN, "UNAUTHORIZED", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "CONFLICT", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Request failed on storage.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INTERNAL_ERROR",
					"Internal error.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn storage_detail_is_not_leaked() {
		let err = ApiError::from(ServiceError::Storage {
			message: "connection refused to 10.0.0.4".to_string(),
		});

		assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(err.error_code, "INTERNAL_ERROR");
		assert!(!err.message.contains("10.0.0.4"));
	}

	#[test]
	fn service_errors_map_to_status_codes() {
		let cases = [
			(
				ServiceError::InvalidRequest {
					field: "$.limit".to_string(),
					message: "limit must be between 1 and 100.".to_string(),
				},
				StatusCode::UNPROCESSABLE_ENTITY,
				"INVALID_REQUEST",
			),
			(
				ServiceError::Unauthorized { message: "no".to_string() },
				StatusCode::FORBIDDEN,
				"UNAUTHORIZED",
			),
			(
				ServiceError::NotFound { message: "gone".to_string() },
				StatusCode::NOT_FOUND,
				"NOT_FOUND",
			),
			(
				ServiceError::Conflict { message: "dup".to_string() },
				StatusCode::CONFLICT,
				"CONFLICT",
			),
		];

		for (err, status, code) in cases {
			let mapped = ApiError::from(err);

			assert_eq!(mapped.status, status);
			assert_eq!(mapped.error_code, code);
		}

		let invalid = ApiError::from(ServiceError::InvalidRequest {
			field: "$.limit".to_string(),
			message: "bad".to_string(),
		});

		assert_eq!(invalid.fields, Some(vec!["$.limit".to_string()]));
	}
}
