use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
	response::Response,
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use brawl_api::{routes, state::AppState};
use brawl_domain::{FindQuery, pipeline::Pipeline};
use brawl_storage::{BattleStore, BoxFuture};
use brawl_testkit::{MemoryStore, fixtures};

const DAY_MS: i64 = 86_400_000;
const BASE_MS: i64 = 1_604_448_000_000;

struct DownStore;
impl BattleStore for DownStore {
	fn find<'a>(
		&'a self,
		_query: &'a FindQuery,
	) -> BoxFuture<'a, brawl_storage::Result<Vec<Value>>> {
		Box::pin(async move { Err(sqlx::Error::PoolTimedOut.into()) })
	}

	fn aggregate<'a>(
		&'a self,
		_pipeline: &'a Pipeline,
	) -> BoxFuture<'a, brawl_storage::Result<Vec<Value>>> {
		Box::pin(async move { Err(sqlx::Error::PoolTimedOut.into()) })
	}
}

fn app_with(store: Arc<dyn BattleStore>, cookie_domain: Option<&str>) -> Router {
	let mut config = fixtures::config("postgres://unused");

	config.service.cookie_domain = cookie_domain.map(str::to_string);

	routes::router(AppState::with_store(config, store))
}

fn seeded_app() -> Router {
	let store = MemoryStore::new(vec![
		fixtures::with_extracted(fixtures::solo(BASE_MS + 1_000, 2, 6), "SHELLY"),
		fixtures::with_extracted(fixtures::solo(BASE_MS + DAY_MS, 1, 10), "SPIKE"),
		fixtures::with_profile(
			fixtures::team(BASE_MS + 2_000, "gemGrab", 8),
			json!([{"name": "SHELLY"}]),
		),
	]);

	app_with(Arc::new(store), None)
}

async fn send(app: Router, request: Request<Body>) -> Response {
	app.oneshot(request).await.expect("Failed to call router.")
}

async fn get(app: Router, uri: &str) -> Response {
	send(app, Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request."))
		.await
}

async fn json_body(response: Response) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

fn set_cookies(response: &Response) -> Vec<String> {
	response
		.headers()
		.get_all(header::SET_COOKIE)
		.iter()
		.map(|value| value.to_str().expect("Cookie must be ASCII.").to_string())
		.collect()
}

#[tokio::test]
async fn health_ok() {
	let response = get(seeded_app(), "/health").await;

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn battles_returns_exact_result_and_client_state_cookies() {
	let uri = format!(
		"/v1/battles?start_time={}&end_time={}&brawler=%5B%22SHELLY%22%5D&limit=abc",
		BASE_MS,
		BASE_MS + 10_000
	);
	let response = get(seeded_app(), &uri).await;

	assert_eq!(response.status(), StatusCode::OK);

	let cookies = set_cookies(&response);

	assert_eq!(
		cookies,
		vec![
			format!(
				"time=%7B%22startTime%22%3A{}%2C%22stopTime%22%3A{}%7D; Path=/",
				BASE_MS,
				BASE_MS + 10_000
			),
			"brawlerSel=%5B%22SHELLY%22%5D; Path=/".to_string(),
		]
	);

	let json = json_body(response).await;

	assert_eq!(json["resultCount"], 1);
	assert_eq!(json["forced"], false);
	assert_eq!(json["flags"]["provenance"], "exact");
	assert_eq!(json["limit"], 0);
	assert_eq!(json["records"][0]["extracted"]["player"]["brawler"]["name"], "SHELLY");
}

#[tokio::test]
async fn battles_without_parameters_sets_sentinel_cookies() {
	let app = app_with(Arc::new(MemoryStore::default()), Some("example.com"));
	let response = send(
		app,
		Request::builder()
			.method("POST")
			.uri("/v1/battles")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		set_cookies(&response),
		vec![
			"time=%7B%22startTime%22%3A-1%2C%22stopTime%22%3A-1%7D; Path=/; Domain=example.com"
				.to_string(),
			"brawlerSel=%5B%22%2A%22%5D; Path=/; Domain=example.com".to_string(),
		]
	);

	let json = json_body(response).await;

	assert_eq!(json["resultCount"], 0);
	assert_eq!(json["forced"], true);
	assert_eq!(json["flags"]["provenance"], "forwardRelaxed");
	assert_eq!(json["appliedFilter"], json!({}));
}

#[tokio::test]
async fn battles_relax_forward_when_window_is_empty() {
	let uri = format!(
		"/v1/battles?start_time={}&end_time={}&mode=%5B%22soloShowdown%22%5D",
		BASE_MS + 3_000,
		BASE_MS + 4_000
	);
	let json = json_body(get(seeded_app(), &uri).await).await;

	assert_eq!(json["forced"], true);
	assert_eq!(json["flags"]["provenance"], "forwardRelaxed");
	assert_eq!(json["limit"], 1);
	assert_eq!(json["records"][0]["epoch"], fixtures::epoch(BASE_MS + DAY_MS).to_rfc3339());
}

#[tokio::test]
async fn stats_interval_and_brawlers() {
	let app = seeded_app();
	let stats = json_body(get(app.clone(), "/v1/stats").await).await;

	assert_eq!(
		stats["rankDistribution"],
		json!([
			{"date": "2020-11-05", "rank": 1, "count": 1},
			{"date": "2020-11-04", "rank": 2, "count": 1}
		])
	);
	assert_eq!(stats["overallDailyTrophySummary"][1]["totalTrophyChange"], 14);

	let interval = json_body(get(app.clone(), "/v1/interval").await).await;

	assert_eq!(interval["start"], fixtures::epoch(BASE_MS + 1_000).to_rfc3339());
	assert_eq!(interval["end"], fixtures::epoch(BASE_MS + DAY_MS).to_rfc3339());

	let brawlers = json_body(get(app, "/v1/brawlers").await).await;

	assert_eq!(brawlers, json!({"hasData": true, "brawlers": [{"name": "SHELLY"}]}));
}

#[tokio::test]
async fn empty_store_reports_no_data() {
	let app = app_with(Arc::new(MemoryStore::default()), None);
	let interval = json_body(get(app.clone(), "/v1/interval").await).await;

	assert_eq!(interval, json!({"start": null, "end": null}));

	let brawlers = json_body(get(app, "/v1/brawlers").await).await;

	assert_eq!(brawlers, json!({"hasData": false, "brawlers": []}));
}

#[tokio::test]
async fn client_state_resets_only_missing_or_unreadable_cookies() {
	let app = app_with(Arc::new(MemoryStore::default()), None);
	let response = send(
		app,
		Request::builder()
			.uri("/v1/client-state")
			.header(header::COOKIE, "time=%7B%22startTime%22%3A5%2C%22stopTime%22%3A9%7D; brawlerSel=oops")
			.body(Body::empty())
			.expect("Failed to build request."),
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(set_cookies(&response), vec!["brawlerSel=%5B%22%2A%22%5D; Path=/".to_string()]);
	assert_eq!(
		json_body(response).await,
		json!({"time": {"startTime": 5, "stopTime": 9}, "brawlerSel": ["*"]})
	);
}

#[tokio::test]
async fn store_failure_maps_to_service_unavailable() {
	let app = app_with(Arc::new(DownStore), None);
	let response = get(app, "/v1/stats").await;

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "STORE_UNAVAILABLE");
}

#[test]
fn config_flag_is_required() {
	use clap::Parser;

	let args = brawl_api::Args::try_parse_from(["brawl-api", "-c", "brawl.toml"])
		.expect("Failed to parse arguments.");

	assert_eq!(args.config, std::path::PathBuf::from("brawl.toml"));
	assert!(brawl_api::Args::try_parse_from(["brawl-api"]).is_err());
}
