use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub player: Player,
	#[serde(default)]
	pub normalizer: Normalizer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Optional. Domain attribute for the client-state cookies; host-only when unset.
	#[serde(default)]
	pub cookie_domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	/// Upper bound for a single store call on the request path.
	#[serde(default = "default_query_timeout_ms")]
	pub query_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Player {
	/// Tag of the tracked player, including the leading `#`.
	pub tag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Normalizer {
	#[serde(default = "default_batch_size")]
	pub batch_size: u32,
}
impl Default for Normalizer {
	fn default() -> Self {
		Self { batch_size: default_batch_size() }
	}
}

fn default_query_timeout_ms() -> u64 {
	5_000
}

fn default_batch_size() -> u32 {
	500
}
