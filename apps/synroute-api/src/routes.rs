use axum::{
	Json, Router,
	extract::{Path, State, rejection::PathRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;
use synroute_domain::metrics::RunStatistics;
use synroute_service::{Error as ServiceError, PredictionSummary, RouteTree, RunView};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/runs/{run_id}", get(get_run))
		.route("/v1/runs/{run_id}/targets/{target_id}/predictions", get(list_predictions))
		.route("/v1/routes/{route_id}/tree", get(get_route_tree))
		.route("/v1/runs/{run_id}/stocks/{stock_id}/statistics", get(get_statistics))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn get_run(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RunView>, ApiError> {
	let Path(run_id) = path?;
	let response = state.service.get_run(run_id).await?;

	Ok(Json(response))
}

async fn list_predictions(
	State(state): State<AppState>,
	path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Json<Vec<PredictionSummary>>, ApiError> {
	let Path((run_id, target_id)) = path?;
	let response = state.service.list_target_predictions(run_id, target_id).await?;

	Ok(Json(response))
}

async fn get_route_tree(
	State(state): State<AppState>,
	path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RouteTree>, ApiError> {
	let Path(route_id) = path?;
	let response = state.service.get_route_tree(route_id).await?;

	Ok(Json(response))
}

async fn get_statistics(
	State(state): State<AppState>,
	path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Json<RunStatistics>, ApiError> {
	let Path((run_id, stock_id)) = path?;
	let response = state.service.get_run_statistics(run_id, stock_id).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let status = match &err {
			ServiceError::InvalidRequest { .. } | ServiceError::MalformedTree { .. } =>
				StatusCode::BAD_REQUEST,
			ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
			ServiceError::DuplicateInput { .. } | ServiceError::Conflict { .. } =>
				StatusCode::CONFLICT,
			ServiceError::Storage { .. } => {
				tracing::error!(error = %err, "Request failed in the store.");

				return Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					err.code(),
					"Internal storage error.",
				);
			},
		};

		Self::new(status, err.code(), err.to_string())
	}
}

impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
