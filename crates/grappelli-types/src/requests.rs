//! Request parameter types for the admin API surface

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Soft-delete visibility requested by an index listing.
///
/// The `withTrashed` query parameter accepts several synonyms per mode;
/// anything unrecognized falls back to [`TrashedMode::Without`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrashedMode {
	/// Exclude soft-deleted rows (the default)
	#[default]
	Without,
	/// Include soft-deleted rows alongside live ones
	With,
	/// Only soft-deleted rows
	Only,
}

impl TrashedMode {
	/// Parse the request parameter, honoring every documented synonym.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_types::TrashedMode;
	///
	/// assert_eq!(TrashedMode::parse(Some("all")), TrashedMode::With);
	/// assert_eq!(TrashedMode::parse(Some("deleted")), TrashedMode::Only);
	/// assert_eq!(TrashedMode::parse(None), TrashedMode::Without);
	/// assert_eq!(TrashedMode::parse(Some("garbage")), TrashedMode::Without);
	/// ```
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
			Some("with") | Some("all") | Some("2") | Some("true") => TrashedMode::With,
			Some("only") | Some("deleted") | Some("1") => TrashedMode::Only,
			_ => TrashedMode::Without,
		}
	}
}

/// Sort direction for index listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	Asc,
	#[default]
	Desc,
}

/// Query parameters honored by the index pipeline
///
/// # Examples
///
/// ```
/// use grappelli_types::{IndexQuery, SortDirection};
///
/// let query = IndexQuery::default()
///     .with_search("alice")
///     .with_sort("name", SortDirection::Asc)
///     .with_per_page(10);
///
/// assert_eq!(query.search.as_deref(), Some("alice"));
/// assert_eq!(query.per_page, Some(10));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuery {
	/// Free-text search term
	#[serde(default)]
	pub search: Option<String>,
	/// Submitted filter payload, keyed by filter key (split range keys
	/// `{field}_from`/`{field}_to` arrive here too and are normalized by
	/// the pipeline before dispatch)
	#[serde(default)]
	pub filters: serde_json::Map<String, Value>,
	/// Requested sort field key
	#[serde(default)]
	pub sort_field: Option<String>,
	/// Requested sort direction
	#[serde(default)]
	pub sort_direction: Option<SortDirection>,
	/// Page number (1-indexed)
	#[serde(default)]
	pub page: Option<u64>,
	/// Page size override
	#[serde(default)]
	pub per_page: Option<u64>,
	/// Soft-delete visibility (raw; see [`TrashedMode::parse`])
	#[serde(default)]
	pub with_trashed: Option<String>,
	/// Comma-separated field keys for column narrowing
	#[serde(default)]
	pub fields: Option<String>,
}

impl IndexQuery {
	/// Set the search term
	pub fn with_search(mut self, term: impl Into<String>) -> Self {
		self.search = Some(term.into());
		self
	}

	/// Set sort field and direction
	pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
		self.sort_field = Some(field.into());
		self.sort_direction = Some(direction);
		self
	}

	/// Set the page size
	pub fn with_per_page(mut self, per_page: u64) -> Self {
		self.per_page = Some(per_page);
		self
	}

	/// Set the page number (1-indexed)
	pub fn with_page(mut self, page: u64) -> Self {
		self.page = Some(page);
		self
	}

	/// Submit a filter value
	pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
		self.filters.insert(key.into(), value);
		self
	}

	/// Set the soft-delete visibility parameter
	pub fn with_trashed(mut self, raw: impl Into<String>) -> Self {
		self.with_trashed = Some(raw.into());
		self
	}

	/// Restrict selected columns to the given comma-separated field keys
	pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
		self.fields = Some(fields.into());
		self
	}

	/// Parsed soft-delete visibility
	pub fn trashed_mode(&self) -> TrashedMode {
		TrashedMode::parse(self.with_trashed.as_deref())
	}

	/// Requested field keys for column narrowing, if any
	pub fn requested_fields(&self) -> Option<Vec<String>> {
		self.fields.as_ref().map(|csv| {
			csv.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		})
	}
}

/// Request body for create/update mutations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationRequest {
	/// Submitted attribute values
	#[serde(flatten)]
	pub data: HashMap<String, Value>,
}

impl MutationRequest {
	/// Build from key/value pairs
	pub fn from_pairs(pairs: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
		Self {
			data: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
		}
	}
}

/// Request body for bulk delete
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulkDeleteRequest {
	/// Primary keys to delete
	pub ids: Vec<String>,
}

/// Request body for attaching related records to a many-to-many field
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AttachRequest {
	/// Related primary keys to attach
	pub ids: Vec<Value>,
	/// Extra pivot column values applied to every attached row
	#[serde(default)]
	pub pivot: HashMap<String, Value>,
}

/// Request body for detaching related records from a many-to-many field
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetachRequest {
	/// Related primary keys to detach
	pub ids: Vec<Value>,
}

/// Query parameters for field option resolution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsQuery {
	/// Free-text search over the related resource
	#[serde(default)]
	pub search: Option<String>,
	/// Primary keys to exclude from the result set
	#[serde(default)]
	pub exclude: Vec<Value>,
	/// Filter payload forwarded to the related resource
	#[serde(default)]
	pub filters: serde_json::Map<String, Value>,
	/// Explicit ordering column
	#[serde(default)]
	pub order_by: Option<String>,
	/// Ordering direction
	#[serde(default)]
	pub sort_direction: Option<SortDirection>,
	/// Result-count limit (default 15, hard cap 100)
	#[serde(default)]
	pub limit: Option<u64>,
	/// Page number for the paginated variant
	#[serde(default)]
	pub page: Option<u64>,
}

/// Request body for running a resource action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRequest {
	/// Target primary keys (empty for standalone actions)
	#[serde(default)]
	pub ids: Vec<Value>,
	/// Action field values submitted alongside
	#[serde(default)]
	pub fields: HashMap<String, Value>,
}
