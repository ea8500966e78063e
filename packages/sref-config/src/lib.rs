mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Popularity, Postgres, Search, SearchCache, Security, Service, Storage, Trending, Worker,
};

use std::{fs, path::Path};

pub const HARD_MAX_LIMIT: u32 = 100;
pub const HARD_MAX_QUERY_TERMS: u32 = 10;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
	let mut cfg: Config =
		toml::from_str(&raw).map_err(|source| Error::Parse { path: path.to_path_buf(), source })?;

	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (key, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
	] {
		if value.trim().is_empty() {
			return Err(Error::invalid(key, "must be non-empty."));
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}

	validate_search(&cfg.search)?;

	if cfg.trending.window_hours <= 0 {
		return Err(Error::invalid("trending.window_hours", "must be greater than zero."));
	}
	if !matches!(
		cfg.trending.event_kind.as_str(),
		"VIEW" | "LIKE" | "FAVORITE" | "SHARE" | "DOWNLOAD" | "COMMENT"
	) {
		return Err(Error::invalid(
			"trending.event_kind",
			"must be one of VIEW, LIKE, FAVORITE, SHARE, DOWNLOAD, or COMMENT.",
		));
	}

	for (key, weight) in [
		("popularity.view_weight", cfg.popularity.view_weight),
		("popularity.like_weight", cfg.popularity.like_weight),
		("popularity.favorite_weight", cfg.popularity.favorite_weight),
		("popularity.download_weight", cfg.popularity.download_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::invalid(key, "must be a finite number."));
		}
		if weight < 0.0 {
			return Err(Error::invalid(key, "must be zero or greater."));
		}
	}

	if cfg.worker.recompute_interval_seconds <= 0 {
		return Err(Error::invalid(
			"worker.recompute_interval_seconds",
			"must be greater than zero.",
		));
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::invalid("worker.poll_interval_ms", "must be greater than zero."));
	}

	Ok(())
}

fn validate_search(search: &Search) -> Result<()> {
	if search.max_limit == 0 || search.max_limit > HARD_MAX_LIMIT {
		return Err(Error::invalid(
			"search.max_limit",
			format!("must be in the range 1-{HARD_MAX_LIMIT}."),
		));
	}
	if search.default_limit == 0 || search.default_limit > search.max_limit {
		return Err(Error::invalid(
			"search.default_limit",
			"must be greater than zero and no larger than search.max_limit.",
		));
	}
	if search.max_query_chars == 0 {
		return Err(Error::invalid("search.max_query_chars", "must be greater than zero."));
	}
	if search.max_query_terms == 0 || search.max_query_terms > HARD_MAX_QUERY_TERMS {
		return Err(Error::invalid(
			"search.max_query_terms",
			format!("must be in the range 1-{HARD_MAX_QUERY_TERMS}."),
		));
	}
	if search.max_filter_values == 0 {
		return Err(Error::invalid("search.max_filter_values", "must be greater than zero."));
	}
	if !matches!(search.text_mode.as_str(), "full_text" | "substring") {
		return Err(Error::invalid("search.text_mode", "must be one of full_text or substring."));
	}
	if search.facet_limit == 0 {
		return Err(Error::invalid("search.facet_limit", "must be greater than zero."));
	}
	if search.cache.ttl_seconds <= 0 {
		return Err(Error::invalid("search.cache.ttl_seconds", "must be greater than zero."));
	}

	if let Some(max) = search.cache.max_payload_bytes
		&& max == 0
	{
		return Err(Error::invalid(
			"search.cache.max_payload_bytes",
			"must be greater than zero.",
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.search.text_mode = cfg.search.text_mode.trim().to_ascii_lowercase();
	cfg.trending.event_kind = cfg.trending.event_kind.trim().to_ascii_uppercase();

	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}
	if cfg
		.security
		.admin_auth_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.admin_auth_token = None;
	}
}
