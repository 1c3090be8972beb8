mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Normalizer, Player, Postgres, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.query_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.query_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.player.tag.trim().is_empty() {
		return Err(Error::Validation { message: "player.tag must be non-empty.".to_string() });
	}
	if !cfg.player.tag.starts_with('#') {
		return Err(Error::Validation {
			message: "player.tag must start with '#'.".to_string(),
		});
	}
	if cfg.normalizer.batch_size == 0 {
		return Err(Error::Validation {
			message: "normalizer.batch_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.cookie_domain.as_deref().map(|domain| domain.trim().is_empty()).unwrap_or(false)
	{
		cfg.service.cookie_domain = None;
	}

	cfg.player.tag = cfg.player.tag.trim().to_uppercase();
}
