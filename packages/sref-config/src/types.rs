use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub search: Search,
	#[serde(default)]
	pub trending: Trending,
	#[serde(default)]
	pub popularity: Popularity,
	#[serde(default)]
	pub worker: Worker,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	pub max_query_chars: u32,
	/// Upper bound on tokenized full-text terms. Extra terms are ignored.
	pub max_query_terms: u32,
	/// Upper bound on the number of values in a single list filter.
	pub max_filter_values: u32,
	/// Either "full_text" (tokenized prefix match) or "substring" (ILIKE).
	pub text_mode: String,
	pub facet_limit: u32,
	pub cache: SearchCache,
}

#[derive(Debug, Deserialize)]
pub struct SearchCache {
	pub enabled: bool,
	pub ttl_seconds: i64,
	pub max_payload_bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Trending {
	/// Width of each activity window. The prior window ends where the recent one starts.
	pub window_hours: i64,
	pub event_kind: String,
}
impl Default for Trending {
	fn default() -> Self {
		Self { window_hours: 24, event_kind: "VIEW".to_string() }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Popularity {
	pub view_weight: f64,
	pub like_weight: f64,
	pub favorite_weight: f64,
	pub download_weight: f64,
}
impl Default for Popularity {
	fn default() -> Self {
		Self { view_weight: 1.0, like_weight: 3.0, favorite_weight: 5.0, download_weight: 2.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Worker {
	pub recompute_interval_seconds: i64,
	pub poll_interval_ms: u64,
}
impl Default for Worker {
	fn default() -> Self {
		Self { recompute_interval_seconds: 300, poll_interval_ms: 1_000 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
	pub admin_auth_token: Option<String>,
}
