//! # Trellis Conf
//!
//! Settings consumed by the router and dispatcher.
//!
//! Settings are plain serde structs: load them from a TOML (or JSON) file,
//! layer environment variables on top, then validate before building the
//! router.
//!
//! ```
//! use trellis_conf::RoutingSettings;
//!
//! let settings = RoutingSettings::from_toml_str(
//!     r#"
//!     match_cache_capacity = 256
//!     method_override_enabled = false
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.match_cache_capacity, 256);
//! assert!(settings.match_cache_enabled);
//! assert!(!settings.method_override_enabled);
//! settings.validate().unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trellis_exception::{Error, Result};

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "TRELLIS_";

/// Router and dispatcher settings
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
	/// Memoize route lookups per method, path, host and scheme
	pub match_cache_enabled: bool,
	/// Maximum number of memoized lookups before FIFO eviction
	pub match_cache_capacity: usize,
	/// Where the persisted route table is written and read
	pub route_cache_path: Option<PathBuf>,
	pub method_override_enabled: bool,
	/// Body/query field carrying the override verb
	pub method_override_field: String,
	pub method_override_header: String,
	/// Identifier parameter name used by resource routes
	pub default_resource_parameter: String,
}

impl Default for RoutingSettings {
	fn default() -> Self {
		Self {
			match_cache_enabled: true,
			match_cache_capacity: 1000,
			route_cache_path: None,
			method_override_enabled: true,
			method_override_field: "_method".to_string(),
			method_override_header: "X-HTTP-Method-Override".to_string(),
			default_resource_parameter: "id".to_string(),
		}
	}
}

impl RoutingSettings {
	pub fn from_toml_str(contents: &str) -> Result<Self> {
		toml::from_str(contents).map_err(|e| Error::Settings(format!("TOML parse error: {}", e)))
	}

	/// Load settings from a `.toml` or `.json` file
	///
	/// # Errors
	///
	/// Returns [`Error::Settings`] for unreadable files, parse failures and
	/// unsupported extensions.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path)
			.map_err(|e| Error::Settings(format!("Failed to read {}: {}", path.display(), e)))?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => serde_json::from_str(&contents)
				.map_err(|e| Error::Settings(format!("JSON parse error: {}", e))),
			_ => Err(Error::Settings(
				"Supported formats: .toml, .json".to_string(),
			)),
		}
	}

	/// Apply `{prefix}MATCH_CACHE_ENABLED`, `{prefix}MATCH_CACHE_CAPACITY`,
	/// `{prefix}ROUTE_CACHE_PATH` and `{prefix}METHOD_OVERRIDE_ENABLED` from
	/// the process environment.
	pub fn with_env_overrides(self, prefix: &str) -> Result<Self> {
		self.with_overrides_from(prefix, |key| std::env::var(key).ok())
	}

	/// Apply overrides from an arbitrary variable lookup
	///
	/// # Examples
	///
	/// ```
	/// use trellis_conf::RoutingSettings;
	/// use std::collections::HashMap;
	///
	/// let vars = HashMap::from([
	///     ("APP_MATCH_CACHE_CAPACITY", "10"),
	///     ("APP_METHOD_OVERRIDE_ENABLED", "off"),
	/// ]);
	/// let settings = RoutingSettings::default()
	///     .with_overrides_from("APP_", |key| vars.get(key).map(|v| v.to_string()))
	///     .unwrap();
	///
	/// assert_eq!(settings.match_cache_capacity, 10);
	/// assert!(!settings.method_override_enabled);
	/// ```
	pub fn with_overrides_from<F>(mut self, prefix: &str, lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let key = |name: &str| format!("{}{}", prefix, name);

		if let Some(value) = lookup(&key("MATCH_CACHE_ENABLED")) {
			self.match_cache_enabled = parse_bool(&key("MATCH_CACHE_ENABLED"), &value)?;
		}
		if let Some(value) = lookup(&key("MATCH_CACHE_CAPACITY")) {
			self.match_cache_capacity = value.trim().parse().map_err(|e| {
				Error::Settings(format!(
					"Invalid value for '{}': {}",
					key("MATCH_CACHE_CAPACITY"),
					e
				))
			})?;
		}
		if let Some(value) = lookup(&key("ROUTE_CACHE_PATH")) {
			self.route_cache_path = if value.trim().is_empty() {
				None
			} else {
				Some(PathBuf::from(value))
			};
		}
		if let Some(value) = lookup(&key("METHOD_OVERRIDE_ENABLED")) {
			self.method_override_enabled = parse_bool(&key("METHOD_OVERRIDE_ENABLED"), &value)?;
		}

		tracing::debug!(prefix, "applied routing settings overrides");
		Ok(self)
	}

	/// Check the settings for values the router cannot work with
	///
	/// # Examples
	///
	/// ```
	/// use trellis_conf::RoutingSettings;
	///
	/// let mut settings = RoutingSettings::default();
	/// settings.match_cache_capacity = 0;
	/// assert!(settings.validate().is_err());
	///
	/// settings.match_cache_enabled = false;
	/// assert!(settings.validate().is_ok());
	/// ```
	pub fn validate(&self) -> Result<()> {
		let mut problems = Vec::new();

		if self.match_cache_enabled && self.match_cache_capacity == 0 {
			problems.push("match_cache_capacity must be greater than 0 when the match cache is enabled");
		}
		if self.method_override_enabled && self.method_override_field.trim().is_empty() {
			problems.push("method_override_field must not be empty");
		}
		if self.method_override_enabled && self.method_override_header.trim().is_empty() {
			problems.push("method_override_header must not be empty");
		}
		if self.default_resource_parameter.trim().is_empty() {
			problems.push("default_resource_parameter must not be empty");
		}

		if problems.is_empty() {
			Ok(())
		} else {
			Err(Error::Settings(problems.join("; ")))
		}
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" | "" => Ok(false),
		other => Err(Error::Settings(format!(
			"Invalid boolean for '{}': '{}'",
			key, other
		))),
	}
}
