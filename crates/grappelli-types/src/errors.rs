//! Error types for the admin framework

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation failures, aggregated across a whole mutation.
///
/// Keys are field attribute names; values are the messages collected for
/// that field, in rule-declaration order.
///
/// # Examples
///
/// ```
/// use grappelli_types::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// errors.add("email", "The email field is required");
/// errors.add("email", "The email field must be a valid email address");
///
/// assert!(!errors.is_empty());
/// assert_eq!(errors.get("email").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
	/// Field attribute -> error messages
	pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
	/// Create an empty error bag
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a message against a field
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.errors.entry(field.into()).or_default().push(message.into());
	}

	/// Messages recorded for one field (empty slice when clean)
	pub fn get(&self, field: &str) -> &[String] {
		self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
	}

	/// True when no field has any message
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	/// Merge another error bag into this one
	pub fn merge(&mut self, other: ValidationErrors) {
		for (field, messages) in other.errors {
			self.errors.entry(field).or_default().extend(messages);
		}
	}
}

impl std::fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let count: usize = self.errors.values().map(Vec::len).sum();
		write!(f, "{} validation error(s) across {} field(s)", count, self.errors.len())
	}
}

/// Admin framework error type
///
/// The taxonomy mirrors the boundaries of the system: not-found and
/// authorization failures fire before any query runs, validation failures
/// aggregate per field, and unsupported relation operations surface as
/// structured 422s instead of crashes.
#[derive(Debug, Error)]
pub enum AdminError {
	/// No resource registered under the requested key
	#[error("Resource '{0}' is not registered")]
	ResourceNotFound(String),

	/// The resource has no field with the requested key
	#[error("Field '{field}' does not exist on resource '{resource}'")]
	FieldNotFound {
		/// Resource uri key
		resource: String,
		/// Requested field key
		field: String,
	},

	/// No record with the requested primary key
	#[error("{resource} with id '{id}' not found")]
	RecordNotFound {
		/// Resource uri key
		resource: String,
		/// Requested primary key value
		id: String,
	},

	/// Authorization check failed
	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	/// Mutation input failed validation
	#[error("Validation failed: {0}")]
	Validation(ValidationErrors),

	/// Attach/detach/options requested against a relation kind with no
	/// matching strategy
	#[error("Operation not supported: {0}")]
	UnsupportedOperation(String),

	/// Resource registration failure (duplicate uri key)
	#[error("Registration error: {0}")]
	Registration(String),

	/// Database error
	#[error("Database error: {0}")]
	Database(String),
}

impl AdminError {
	/// HTTP status code equivalent for this error
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_types::AdminError;
	///
	/// assert_eq!(AdminError::ResourceNotFound("users".into()).status_code(), 404);
	/// assert_eq!(AdminError::PermissionDenied("nope".into()).status_code(), 403);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			AdminError::ResourceNotFound(_)
			| AdminError::FieldNotFound { .. }
			| AdminError::RecordNotFound { .. } => 404,
			AdminError::PermissionDenied(_) => 403,
			AdminError::Validation(_) | AdminError::UnsupportedOperation(_) => 422,
			AdminError::Registration(_) => 409,
			AdminError::Database(_) => 500,
		}
	}

	/// Message safe to expose to clients
	///
	/// Database errors hide their internal details.
	pub fn public_message(&self) -> String {
		match self {
			AdminError::Database(_) => "Database operation failed".to_string(),
			other => other.to_string(),
		}
	}
}

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(AdminError::ResourceNotFound("users".into()), 404)]
	#[case(AdminError::FieldNotFound { resource: "users".into(), field: "role".into() }, 404)]
	#[case(AdminError::RecordNotFound { resource: "users".into(), id: "7".into() }, 404)]
	#[case(AdminError::PermissionDenied("update".into()), 403)]
	#[case(AdminError::Validation(ValidationErrors::new()), 422)]
	#[case(AdminError::UnsupportedOperation("has_one".into()), 422)]
	#[case(AdminError::Registration("dup".into()), 409)]
	#[case(AdminError::Database("boom".into()), 500)]
	fn status_codes_follow_the_taxonomy(#[case] error: AdminError, #[case] expected: u16) {
		assert_eq!(error.status_code(), expected);
	}

	#[test]
	fn database_details_are_hidden_from_clients() {
		let error = AdminError::Database("SQL syntax error at line 42".into());
		let message = error.public_message();

		assert_eq!(message, "Database operation failed");
		assert!(!message.contains("SQL"));
	}

	#[test]
	fn validation_errors_aggregate_per_field() {
		let mut errors = ValidationErrors::new();
		errors.add("name", "required");
		errors.add("name", "too short");
		errors.add("email", "invalid");

		assert_eq!(errors.get("name"), &["required".to_string(), "too short".to_string()]);
		assert_eq!(errors.get("email").len(), 1);
		assert!(errors.get("missing").is_empty());
	}

	#[test]
	fn validation_errors_merge_preserves_both_sides() {
		let mut left = ValidationErrors::new();
		left.add("a", "one");
		let mut right = ValidationErrors::new();
		right.add("a", "two");
		right.add("b", "three");

		left.merge(right);

		assert_eq!(left.get("a").len(), 2);
		assert_eq!(left.get("b").len(), 1);
	}
}
