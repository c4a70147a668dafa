//! The filter hierarchy
//!
//! A [`Filter`] translates one submitted `filters[key]` value into a query
//! constraint. Filters are configured at resource-declaration time and are
//! stateless at apply time. Bad, empty, or unparsable values are silent
//! no-ops: the query is left unchanged and no validation error is raised.

mod basic;
mod relational;

pub use basic::{BooleanFilter, ColumnFilter, RangeFilter, RangeKind, SelectFilter};
pub use relational::{DynamicSelectFilter, ExistsFilter, MorphFilter, RelationFilter};

use crate::fields::{Field, FieldType};
use grappelli_types::FilterDescriptor;
use sea_query::SelectStatement;
use serde_json::Value;

/// Table the filtered query selects from, for correlating subqueries
#[derive(Debug, Clone)]
pub struct FilterScope {
	pub table: String,
	pub primary_key: String,
}

impl FilterScope {
	pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
		Self { table: table.into(), primary_key: primary_key.into() }
	}
}

/// The submitted value for one filter key, with lenient accessors
///
/// Every accessor degrades to "nothing" instead of erroring; the filter
/// apply path turns "nothing" into a no-op.
#[derive(Debug, Clone)]
pub struct FilterPayload {
	value: Value,
}

impl FilterPayload {
	pub fn new(value: Value) -> Self {
		Self { value }
	}

	pub fn raw(&self) -> &Value {
		&self.value
	}

	/// Null, empty string, or empty array
	pub fn is_blank(&self) -> bool {
		match &self.value {
			Value::Null => true,
			Value::String(s) => s.is_empty(),
			Value::Array(items) => items.is_empty(),
			_ => false,
		}
	}

	/// Single scalar value, when the payload is one
	pub fn scalar(&self) -> Option<&Value> {
		match &self.value {
			Value::Null | Value::Array(_) | Value::Object(_) => None,
			other => Some(other),
		}
	}

	/// Payload as a value list: an array as-is, a scalar as a singleton
	pub fn list(&self) -> Vec<Value> {
		match &self.value {
			Value::Array(items) => items
				.iter()
				.filter(|v| !v.is_null())
				.cloned()
				.collect(),
			Value::Null | Value::Object(_) => Vec::new(),
			other => vec![other.clone()],
		}
	}

	/// Range bounds from `{start, end}` or a positional two-element array.
	///
	/// Missing, null, and empty-string bounds come back as `None`.
	pub fn bounds(&self) -> (Option<Value>, Option<Value>) {
		fn bound(value: Option<&Value>) -> Option<Value> {
			match value {
				None | Some(Value::Null) => None,
				Some(Value::String(s)) if s.is_empty() => None,
				Some(other) => Some(other.clone()),
			}
		}
		match &self.value {
			Value::Object(map) => (bound(map.get("start")), bound(map.get("end"))),
			Value::Array(items) => (bound(items.first()), bound(items.get(1))),
			_ => (None, None),
		}
	}

	/// Permissive boolean coercion: `true`/`'true'`/`'1'`/`1` and their
	/// false counterparts; anything else is `None`
	pub fn lenient_bool(&self) -> Option<bool> {
		match &self.value {
			Value::Bool(b) => Some(*b),
			Value::Number(n) => match n.as_i64() {
				Some(1) => Some(true),
				Some(0) => Some(false),
				_ => None,
			},
			Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
				"true" | "1" => Some(true),
				"false" | "0" => Some(false),
				_ => None,
			},
			_ => None,
		}
	}
}

impl From<Value> for FilterPayload {
	fn from(value: Value) -> Self {
		Self::new(value)
	}
}

/// Derive a stable payload key from a display name.
///
/// Lowercased with whitespace stripped; non-ASCII characters are dropped,
/// so two names differing only in non-ASCII text collide. Filters exposed
/// under non-ASCII names should set an explicit key.
pub fn derive_key(name: &str) -> String {
	name.chars()
		.filter(|c| c.is_ascii() && !c.is_whitespace())
		.map(|c| c.to_ascii_lowercase())
		.collect()
}

/// A named, keyed query predicate
pub trait Filter: Send + Sync {
	/// Display name
	fn name(&self) -> &str;

	/// Stable payload key matched against `filters[key]`
	fn key(&self) -> String;

	/// Bound storage column, when the filter targets one directly
	fn field(&self) -> Option<&str> {
		None
	}

	/// Constrain the query for a submitted value. A blank or unparsable
	/// payload must leave the query unchanged.
	fn apply(&self, query: &mut SelectStatement, scope: &FilterScope, payload: &FilterPayload);

	/// Transport descriptors. Exactly one for every filter kind except
	/// morph, which expands into a type selector and an entity selector.
	fn descriptors(&self) -> Vec<FilterDescriptor>;
}

/// Auto-derive the index filter for a field flagged filterable
pub fn filter_for_field(field: &Field) -> Option<Box<dyn Filter>> {
	if !field.is_filterable() {
		return None;
	}
	let name = field.label().to_string();
	let key = field.key().to_string();
	let attribute = field.attribute().to_string();
	let filter: Box<dyn Filter> = match field.field_type() {
		FieldType::Toggle => Box::new(BooleanFilter::new(name, attribute).with_key(key)),
		FieldType::Number => Box::new(RangeFilter::number(name, attribute).with_key(key)),
		FieldType::Date | FieldType::DateTime => {
			Box::new(RangeFilter::date(name, attribute).with_key(key))
		}
		FieldType::BelongsTo | FieldType::BelongsToMany | FieldType::HasMany
		| FieldType::MorphToMany => {
			let relation = field.relation()?.clone();
			Box::new(RelationFilter::new(name, relation).with_key(key))
		}
		FieldType::MorphTo => {
			let relation = field.relation()?.clone();
			Box::new(MorphFilter::new(name, relation).with_key(key))
		}
		_ => Box::new(ColumnFilter::new(name, attribute).with_key(key)),
	};
	Some(filter)
}
