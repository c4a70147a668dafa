//! Transport descriptors produced by fields, filters, and dependencies
//!
//! Descriptors are the serialized, frontend-facing shape of the declarative
//! DSL. They carry metadata only; the server never evaluates cross-field
//! conditions for display purposes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Comparison operator used by dependency conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
	Equals,
	NotEquals,
	GreaterThan,
	GreaterThanOrEqual,
	LessThan,
	LessThanOrEqual,
	HasValue,
	IsEmpty,
	IsTruthy,
	IsFalsy,
	In,
	NotIn,
	Contains,
	NotContains,
	StartsWith,
	EndsWith,
	Matches,
}

impl Operator {
	/// Whether the operator needs a comparison value.
	///
	/// False only for the four unary operators.
	///
	/// # Examples
	///
	/// ```
	/// use grappelli_types::Operator;
	///
	/// assert!(Operator::Equals.requires_value());
	/// assert!(!Operator::HasValue.requires_value());
	/// assert!(!Operator::IsTruthy.requires_value());
	/// ```
	pub fn requires_value(&self) -> bool {
		!matches!(
			self,
			Operator::HasValue | Operator::IsEmpty | Operator::IsTruthy | Operator::IsFalsy
		)
	}

	/// Whether the comparison value must be an array.
	pub fn expects_array(&self) -> bool {
		matches!(self, Operator::In | Operator::NotIn)
	}
}

/// One dependency condition: observed field, operator, optional value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDescriptor {
	/// Observed sibling field key
	pub field: String,
	/// Comparison operator
	pub operator: Operator,
	/// Comparison value (absent for unary operators)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
}

/// Dynamic/cascading option-load wiring for a dependent field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsWiring {
	/// Endpoint the client fetches options from; may contain placeholders
	/// such as `{morphType}` that are substituted client-side
	pub endpoint: String,
	/// Request parameter name -> observed field key
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub params: BTreeMap<String, String>,
}

/// Serialized per-field dependency configuration
///
/// Empty lists and unset options are omitted so that a field that never
/// registered a dependency serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
	/// Observed field keys, in declaration order
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub fields: Vec<String>,
	/// Visibility conditions
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub visibility: Vec<ConditionDescriptor>,
	/// Disabled conditions
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub disabled: Vec<ConditionDescriptor>,
	/// Required conditions
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub required: Vec<ConditionDescriptor>,
	/// Dynamic option-load wiring
	#[serde(skip_serializing_if = "Option::is_none")]
	pub options: Option<OptionsWiring>,
	/// Compute formula referencing other field keys
	#[serde(skip_serializing_if = "Option::is_none")]
	pub compute: Option<String>,
	/// Clear this field's value when an observed field changes
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub clear_on_change: bool,
	/// Debounce in milliseconds before reacting to observed changes
	#[serde(skip_serializing_if = "Option::is_none")]
	pub debounce: Option<u64>,
}

impl DependencyDescriptor {
	/// True when no dependency data was ever registered
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
			&& self.visibility.is_empty()
			&& self.disabled.is_empty()
			&& self.required.is_empty()
			&& self.options.is_none()
			&& self.compute.is_none()
			&& !self.clear_on_change
			&& self.debounce.is_none()
	}
}

/// Serialized shape of one field for one view context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
	/// Display label
	pub label: String,
	/// Storage attribute
	pub attribute: String,
	/// API key (differs from attribute for computed/morph fields)
	pub key: String,
	/// Field type name
	#[serde(rename = "type")]
	pub field_type: String,
	/// Frontend component hint (opaque to core logic)
	pub component: String,
	/// Validation rules in transport form (e.g. `"required"`, `"max:255"`)
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub rules: Vec<String>,
	/// Whether the field is required
	pub required: bool,
	/// Whether the field is readonly
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub readonly: bool,
	/// Whether the field is sortable on the index
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub sortable: bool,
	pub show_on_index: bool,
	pub show_on_detail: bool,
	pub show_on_creation: bool,
	pub show_on_update: bool,
	/// Resolved value for the record in context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	/// Dependency configuration, omitted entirely when empty
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dependency: Option<DependencyDescriptor>,
}

/// One selectable choice of a select-style filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
	/// Submitted value
	pub value: Value,
	/// Display label
	pub label: String,
}

/// Serialized shape of one transport filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDescriptor {
	/// Display name
	pub name: String,
	/// Stable payload key (`filters[key]`)
	pub key: String,
	/// Filter type name (range, boolean, select, ...)
	#[serde(rename = "type")]
	pub filter_type: String,
	/// Frontend component hint
	pub component: String,
	/// Bound storage column or relation path
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<String>,
	/// Static choices for select-style filters
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub options: Vec<FilterOption>,
	/// Option-fetch endpoint for dynamic filters; may contain the literal
	/// `{morphType}` placeholder substituted client-side
	#[serde(skip_serializing_if = "Option::is_none")]
	pub endpoint: Option<String>,
	/// Whether multiple values may be selected
	#[serde(default, skip_serializing_if = "std::ops::Not::not")]
	pub multiple: bool,
	/// Filter keys this filter hard-depends on (reset on change)
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub depends_on: Vec<String>,
	/// Filter keys this filter soft-depends on (refresh on change)
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub soft_depends_on: Vec<String>,
}

/// One resolved selectable option `{value, label}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
	/// Related primary key
	pub value: Value,
	/// Resolved display label
	pub label: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unary_operators_do_not_require_values() {
		for op in [Operator::HasValue, Operator::IsEmpty, Operator::IsTruthy, Operator::IsFalsy] {
			assert!(!op.requires_value(), "{op:?} must not require a value");
		}
		for op in [Operator::Equals, Operator::In, Operator::Matches, Operator::Contains] {
			assert!(op.requires_value(), "{op:?} must require a value");
		}
	}

	#[test]
	fn only_in_operators_expect_arrays() {
		assert!(Operator::In.expects_array());
		assert!(Operator::NotIn.expects_array());
		assert!(!Operator::Equals.expects_array());
		assert!(!Operator::Contains.expects_array());
	}

	#[test]
	fn empty_dependency_descriptor_serializes_to_empty_object() {
		let descriptor = DependencyDescriptor::default();
		assert!(descriptor.is_empty());
		assert_eq!(serde_json::to_value(&descriptor).unwrap(), serde_json::json!({}));
	}

	#[test]
	fn operators_serialize_snake_case() {
		assert_eq!(
			serde_json::to_value(Operator::GreaterThanOrEqual).unwrap(),
			serde_json::json!("greater_than_or_equal")
		);
		assert_eq!(serde_json::to_value(Operator::HasValue).unwrap(), serde_json::json!("has_value"));
	}

	#[test]
	fn unary_condition_omits_value() {
		let condition = ConditionDescriptor {
			field: "parent_id".into(),
			operator: Operator::HasValue,
			value: None,
		};
		let json = serde_json::to_value(&condition).unwrap();
		assert!(json.get("value").is_none());
	}
}
