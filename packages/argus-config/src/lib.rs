mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, EmbeddingProviderConfig, Postgres, Providers, Search, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
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
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}

	for (path, value) in [
		("search.embed_sim_min", cfg.search.embed_sim_min),
		("search.final_min", cfg.search.final_min),
	] {
		validate_unit_interval(path, value)?;
	}

	if !cfg.search.relax_step.is_finite() {
		return Err(Error::Validation {
			message: "search.relax_step must be a finite number.".to_string(),
		});
	}
	if cfg.search.relax_step <= 0.0 || cfg.search.relax_step > 1.0 {
		return Err(Error::Validation {
			message: "search.relax_step must be greater than zero and at most 1.0.".to_string(),
		});
	}
	if cfg.search.max_candidates == 0 {
		return Err(Error::Validation {
			message: "search.max_candidates must be greater than zero.".to_string(),
		});
	}
	if cfg.search.fallback_top_k == 0 {
		return Err(Error::Validation {
			message: "search.fallback_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

pub fn validate_unit_interval(path: &str, value: f32) -> Result<()> {
	if !value.is_finite() {
		return Err(Error::Validation { message: format!("{path} must be a finite number.") });
	}
	if !(0.0..=1.0).contains(&value) {
		return Err(Error::Validation {
			message: format!("{path} must be in the range 0.0-1.0."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let level = cfg.service.log_level.trim();

	cfg.service.log_level = if level.is_empty() { "info".to_string() } else { level.to_string() };
	cfg.providers.embedding.api_base =
		cfg.providers.embedding.api_base.trim_end_matches('/').to_string();
}
