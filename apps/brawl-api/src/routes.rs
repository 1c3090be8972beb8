use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header::SET_COOKIE},
	response::{AppendHeaders, IntoResponse, Response},
	routing::get,
};
use serde::Serialize;

use brawl_domain::{
	client_state::{self, BRAWLERS_KEY, ClientState, TIME_KEY},
	parse_params,
};
use brawl_service::{BattlesResponse, BrawlersResponse, Interval, StatsResponse};

use crate::{cookies, state::AppState};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/battles", get(battles).post(battles))
		.route("/v1/stats", get(stats).post(stats))
		.route("/v1/interval", get(interval).post(interval))
		.route("/v1/brawlers", get(brawlers).post(brawlers))
		.route("/v1/client-state", get(restore_client_state))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn battles(
	State(state): State<AppState>,
	Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
	let spec = parse_params(params);
	let retrieval = state.service.battles(&spec).await?;
	let headers = cookies::client_state_headers(&retrieval.client_state, state.cookie_domain());

	Ok((AppendHeaders(headers), Json::<BattlesResponse>(retrieval.response)))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
	let response = state.service.stats().await?;
	Ok(Json(response))
}

async fn interval(State(state): State<AppState>) -> Result<Json<Interval>, ApiError> {
	let response = state.service.interval().await?;
	Ok(Json(response))
}

async fn brawlers(State(state): State<AppState>) -> Result<Json<BrawlersResponse>, ApiError> {
	let response = state.service.brawlers().await?;
	Ok(Json(response))
}

/// Echoes the stored client state, resetting any cookie that is missing or unreadable.
async fn restore_client_state(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> impl IntoResponse {
	let time = cookies::read_cookie(&headers, TIME_KEY);
	let brawlers = cookies::read_cookie(&headers, BRAWLERS_KEY);
	let restored = ClientState::decode(time.as_deref(), brawlers.as_deref());
	let domain = state.cookie_domain();
	let mut reset = Vec::new();

	if time.as_deref().and_then(client_state::decode_time).is_none() {
		reset.push((SET_COOKIE, cookies::set_cookie(TIME_KEY, &restored.encode_time(), domain)));
	}
	if brawlers.as_deref().and_then(client_state::decode_brawlers).is_none() {
		reset.push((
			SET_COOKIE,
			cookies::set_cookie(BRAWLERS_KEY, &restored.encode_brawlers(), domain),
		));
	}

	(AppendHeaders(reset), Json(restored))
}

#[derive(Serialize)]
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

impl From<brawl_service::Error> for ApiError {
	fn from(err: brawl_service::Error) -> Self {
		tracing::error!(error = %err, "Request failed.");

		if err.is_transient() {
			ApiError::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"STORE_UNAVAILABLE",
				"The battle store is unavailable. Retry later.",
			)
		} else {
			ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", err.to_string())
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };
		(self.status, Json(body)).into_response()
	}
}
