//! Configuration surface and hard limits
//!
//! `AdminConfig` carries the recognized options; the `limits` constants are
//! hard caps that guard against resource exhaustion regardless of
//! configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hard resource limits for admin operations
pub mod limits {
	/// Maximum page size for index listings
	pub const MAX_PAGE_SIZE: u64 = 500;

	/// Default page size when neither resource nor request specifies one
	pub const DEFAULT_PAGE_SIZE: u64 = 25;

	/// Default result count for field option resolution
	pub const DEFAULT_OPTIONS_LIMIT: u64 = 15;

	/// Hard cap on field option results
	pub const MAX_OPTIONS_LIMIT: u64 = 100;

	/// Maximum number of fields in a mutation request
	pub const MAX_MUTATION_FIELDS: usize = 100;

	/// Maximum string length for a single field value (in bytes)
	pub const MAX_STRING_LENGTH: usize = 1_000_000;
}

/// Action-event audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionEventConfig {
	/// Record action events at all
	pub enabled: bool,
	/// Persist events on a fire-and-forget background task instead of
	/// inline (never blocks or fails the originating request either way)
	pub queue: bool,
	/// Attribute names whose values are masked in snapshots
	pub exclude_fields: Vec<String>,
}

impl Default for ActionEventConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			queue: false,
			exclude_fields: vec!["password".into(), "remember_token".into(), "secret".into()],
		}
	}
}

/// Recognized configuration options for the admin framework
///
/// # Examples
///
/// ```
/// use grappelli_core::AdminConfig;
///
/// let config = AdminConfig::default();
/// assert_eq!(config.api_prefix, "/admin/api");
/// assert!(config.action_events.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
	/// Prefix for option-endpoint URLs handed to the frontend
	pub api_prefix: String,
	/// Cache key under which the registry map may be memoized
	pub registry_cache_key: String,
	/// Field type name -> frontend component overrides
	pub component_overrides: HashMap<String, String>,
	/// Audit log settings
	pub action_events: ActionEventConfig,
	/// Default page size for index listings
	pub per_page: u64,
	/// Upper bound accepted from `perPage` requests
	pub max_per_page: u64,
}

impl Default for AdminConfig {
	fn default() -> Self {
		Self {
			api_prefix: "/admin/api".into(),
			registry_cache_key: "grappelli.resources".into(),
			component_overrides: HashMap::new(),
			action_events: ActionEventConfig::default(),
			per_page: limits::DEFAULT_PAGE_SIZE,
			max_per_page: limits::MAX_PAGE_SIZE,
		}
	}
}

impl AdminConfig {
	/// Component name for a field type, honoring configured overrides
	pub fn component_for(&self, field_type: &str, default: &str) -> String {
		self.component_overrides
			.get(field_type)
			.cloned()
			.unwrap_or_else(|| default.to_string())
	}
}
