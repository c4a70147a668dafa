//! Response types for the admin API surface

use crate::descriptors::{FieldDescriptor, FilterDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Per-record abilities of the current actor
///
/// `restore` and `force_delete` are only meaningful for soft-deleting
/// resources and stay `false` otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
	pub view: bool,
	pub update: bool,
	pub delete: bool,
	pub force_delete: bool,
	pub restore: bool,
	pub attach: bool,
	pub detach: bool,
}

/// Serialized action exposed on a resource or record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
	/// Display name
	pub name: String,
	/// URI-safe key
	pub uri_key: String,
	/// Runs without record targets when true
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub standalone: bool,
}

/// One transformed record of an index listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDescriptor {
	/// Primary key value
	pub id: Value,
	/// Per-field descriptors for the fields visible in this view
	pub attributes: Vec<FieldDescriptor>,
	/// Soft-delete timestamp, if the row is trashed
	#[serde(skip_serializing_if = "Option::is_none")]
	pub deleted_at: Option<Value>,
	/// Abilities of the current actor on this record
	pub permissions: PermissionSet,
	/// Actions runnable against this record
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub actions: Vec<ActionDescriptor>,
}

/// Paginated index listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
	/// Resource uri key
	pub resource: String,
	/// Total matching records (before pagination)
	pub count: u64,
	/// Current page (1-indexed)
	pub page: u64,
	/// Page size used
	pub per_page: u64,
	/// Total pages at this page size
	pub total_pages: u64,
	/// Transformed records
	pub records: Vec<RecordDescriptor>,
}

/// Single-record detail payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
	/// Resource uri key
	pub resource: String,
	/// Transformed record
	pub record: RecordDescriptor,
}

/// Result of a create/update/delete/restore mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
	pub success: bool,
	pub message: String,
	/// Rows affected, when known
	#[serde(skip_serializing_if = "Option::is_none")]
	pub affected: Option<u64>,
	/// Mutated data echoed back
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<HashMap<String, Value>>,
}

/// Column metadata for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
	/// Storage field name
	pub field: String,
	/// Humanized label
	pub label: String,
	/// Whether the index may sort by this column
	pub sortable: bool,
}

/// Static metadata about one registered resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
	/// URI-safe key
	pub key: String,
	/// Display name
	pub name: String,
	/// Singular title
	pub title: String,
	/// Whether the resource soft-deletes
	pub soft_deletes: bool,
	/// Default page size
	pub per_page: u64,
	/// Allowed page sizes
	pub per_page_options: Vec<u64>,
	/// Searchable storage columns
	pub searchable: Vec<String>,
	/// Index column metadata
	pub columns: Vec<ColumnInfo>,
}

/// Metadata payload listing a resource's fields for one view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsResponse {
	pub resource: String,
	pub fields: Vec<FieldDescriptor>,
}

/// Metadata payload listing a resource's transport filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersResponse {
	pub resource: String,
	pub filters: Vec<FilterDescriptor>,
}

/// Outcome of an executed action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionOutcome {
	/// Success with a user-facing message
	Message { message: String },
	/// Failure surfaced to the user (caught at the dispatch boundary)
	Danger { message: String },
	/// Client should navigate to the given URL
	Redirect { url: String },
}

/// Convert a snake_case field name to a Title Case label.
///
/// # Examples
///
/// ```
/// use grappelli_types::field_to_label;
///
/// assert_eq!(field_to_label("user_name"), "User Name");
/// assert_eq!(field_to_label("id"), "Id");
/// ```
pub fn field_to_label(field: &str) -> String {
	field
		.split('_')
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				None => String::new(),
				Some(first) => first.to_uppercase().chain(chars).collect(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn field_to_label_title_cases_words() {
		assert_eq!(field_to_label("created_at"), "Created At");
		assert_eq!(field_to_label("display_name"), "Display Name");
		assert_eq!(field_to_label(""), "");
	}

	#[test]
	fn action_outcome_tags_by_type() {
		let outcome = ActionOutcome::Danger { message: "failed".into() };
		let json = serde_json::to_value(&outcome).unwrap();
		assert_eq!(json["type"], "danger");
		assert_eq!(json["message"], "failed");
	}

	#[test]
	fn permission_set_defaults_to_all_denied() {
		let permissions = PermissionSet::default();
		assert!(!permissions.view);
		assert!(!permissions.force_delete);
	}

	#[test]
	fn record_descriptor_omits_absent_deleted_at() {
		let record = RecordDescriptor {
			id: serde_json::json!(1),
			attributes: vec![],
			deleted_at: None,
			permissions: PermissionSet::default(),
			actions: vec![],
		};
		let json = serde_json::to_value(&record).unwrap();
		assert!(json.get("deleted_at").is_none());
	}
}
