//! The resource abstraction
//!
//! A [`Resource`] aggregates the fields, filters, and actions describing
//! one persisted-model type, plus the query hooks the pipeline and option
//! services consult. Implementations are plain structs registered with the
//! [`crate::registry::ResourceRegistry`] at startup.

use crate::actions::Action;
use crate::config::limits;
use crate::fields::{ensure_unique_keys, flatten, Field, FieldContext, FieldElement};
use crate::filters::{filter_for_field, Filter};
use crate::util::uri_key_for;
use grappelli_types::{AdminResult, Record};
use sea_query::SelectStatement;
use serde_json::Value;

/// One admin-managed model type
///
/// Only `name`, `table`, and `fields` are mandatory; everything else has a
/// conventional default. The trait is object-safe and shared across
/// requests behind an `Arc`.
pub trait Resource: Send + Sync {
	/// Type name the uri key is derived from, e.g. `"UserResource"`
	fn name(&self) -> &str;

	/// URI-safe plural key, e.g. `UserResource` -> `users`
	fn uri_key(&self) -> String {
		uri_key_for(self.name())
	}

	/// Storage table
	fn table(&self) -> &str;

	/// Primary key column
	fn primary_key(&self) -> &str {
		"id"
	}

	/// Attribute used as the record title in labels and options
	fn title_attribute(&self) -> &str {
		"name"
	}

	/// Field declaration for one request context. Called once per request;
	/// the returned fields are treated as read-only afterwards.
	fn fields(&self, ctx: &FieldContext) -> Vec<FieldElement>;

	/// Custom filters, merged with the field-derived ones
	fn filters(&self) -> Vec<Box<dyn Filter>> {
		Vec::new()
	}

	/// Custom actions
	fn actions(&self) -> Vec<Box<dyn Action>> {
		Vec::new()
	}

	/// Columns the index search term matches against
	fn searchable_columns(&self) -> Vec<String> {
		Vec::new()
	}

	/// Dot-notation relation paths the search term also matches against,
	/// e.g. `author.name`
	fn searchable_relations(&self) -> Vec<String> {
		Vec::new()
	}

	/// Whether deletes set a timestamp instead of removing the row
	fn soft_deletes(&self) -> bool {
		false
	}

	/// Soft-delete timestamp column
	fn deleted_at_column(&self) -> &str {
		"deleted_at"
	}

	/// Creation timestamp column, used as the default index order.
	/// `None` drops the default order back to the primary key.
	fn created_at_column(&self) -> Option<&str> {
		Some("created_at")
	}

	/// Default index page size
	fn per_page(&self) -> u64 {
		limits::DEFAULT_PAGE_SIZE
	}

	/// Page sizes the index accepts from `perPage`
	fn per_page_options(&self) -> Vec<u64> {
		vec![25, 50, 100]
	}

	/// Relation names eager-loaded on every index request
	fn with_index(&self) -> Vec<String> {
		Vec::new()
	}

	/// Relation names eager-loaded on every detail request
	fn with_detail(&self) -> Vec<String> {
		Vec::new()
	}

	/// Scope hook applied to every index query
	fn index_query(&self, _query: &mut SelectStatement) {}

	/// Scope hook applied to every option-resolution query
	fn options_query(&self, _query: &mut SelectStatement) {}

	/// Custom display label for a record; `None` falls through to the
	/// common-attribute scan
	fn display_label(&self, _record: &Record) -> Option<String> {
		None
	}
}

/// Derived helpers shared by the pipeline and services
pub trait ResourceExt: Resource {
	/// Flattened field list with section containers dissolved, checked for
	/// key uniqueness
	fn flat_fields(&self, ctx: &FieldContext) -> AdminResult<Vec<Field>> {
		let fields = flatten(&self.fields(ctx));
		ensure_unique_keys(&fields)?;
		Ok(fields)
	}

	/// Look up one field by API key
	fn field_by_key(&self, ctx: &FieldContext, key: &str) -> AdminResult<Option<Field>> {
		Ok(self
			.flat_fields(ctx)?
			.into_iter()
			.find(|field| field.key() == key))
	}

	/// Declared filters merged with the ones auto-derived from filterable
	/// fields. Declared filters come first and win descriptor order.
	fn all_filters(&self, ctx: &FieldContext) -> AdminResult<Vec<Box<dyn Filter>>> {
		let mut filters = self.filters();
		let declared_keys: Vec<String> = filters.iter().map(|f| f.key()).collect();
		for field in self.flat_fields(ctx)? {
			if let Some(derived) = filter_for_field(&field) {
				if !declared_keys.contains(&derived.key()) {
					filters.push(derived);
				}
			}
		}
		Ok(filters)
	}

	/// Resolve the display label for one record: `display_label` hook,
	/// then the title attribute, then the common-attribute fallback scan,
	/// then the primary key
	fn record_label(&self, record: &Record) -> String {
		if let Some(label) = self.display_label(record) {
			return label;
		}
		let mut candidates: Vec<&str> = vec![self.title_attribute()];
		candidates.extend(crate::options::FALLBACK_LABEL_ATTRIBUTES);
		for attribute in candidates {
			if let Some(Value::String(text)) = record.get(attribute) {
				if !text.is_empty() {
					return text.clone();
				}
			}
		}
		record
			.get(self.primary_key())
			.map(|id| match id {
				Value::String(s) => s.clone(),
				other => other.to_string(),
			})
			.unwrap_or_default()
	}
}

impl<R: Resource + ?Sized> ResourceExt for R {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::Section;

	struct PostResource;

	impl Resource for PostResource {
		fn name(&self) -> &str {
			"PostResource"
		}

		fn table(&self) -> &str {
			"posts"
		}

		fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
			vec![
				Field::text("Title", "title").filterable().into(),
				Section::new("Meta")
					.with_field(Field::toggle("Published", "published").filterable())
					.into(),
			]
		}

		fn title_attribute(&self) -> &str {
			"title"
		}
	}

	#[test]
	fn uri_key_is_derived_from_the_type_name() {
		assert_eq!(PostResource.uri_key(), "posts");
	}

	#[test]
	fn flat_fields_dissolve_sections() {
		let fields = PostResource.flat_fields(&FieldContext::empty()).unwrap();
		let keys: Vec<&str> = fields.iter().map(|f| f.key()).collect();
		assert_eq!(keys, vec!["title", "published"]);
	}

	#[test]
	fn all_filters_merges_derived_with_declared() {
		let filters = PostResource.all_filters(&FieldContext::empty()).unwrap();
		let keys: Vec<String> = filters.iter().map(|f| f.key()).collect();
		assert_eq!(keys, vec!["title".to_string(), "published".to_string()]);
	}

	#[test]
	fn record_label_prefers_title_then_fallbacks_then_pk() {
		let resource = PostResource;

		let mut record = Record::new();
		record.insert("title".into(), serde_json::json!("Hello"));
		assert_eq!(resource.record_label(&record), "Hello");

		let mut record = Record::new();
		record.insert("name".into(), serde_json::json!("Named"));
		assert_eq!(resource.record_label(&record), "Named");

		let mut record = Record::new();
		record.insert("id".into(), serde_json::json!(42));
		assert_eq!(resource.record_label(&record), "42");
	}
}
