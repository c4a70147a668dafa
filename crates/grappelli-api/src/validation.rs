//! Mutation input validation and fillable extraction
//!
//! A mutation payload is reduced to the attributes the view's fields
//! actually accept (fillable extraction), then checked against each
//! field's rule set with errors aggregated per field key. Readonly fields
//! and the primary key are silently dropped from the payload rather than
//! rejected.

use grappelli_core::config::limits;
use grappelli_core::fields::{Field, FieldContext, FieldType, View};
use grappelli_types::{AdminError, AdminResult, ValidationErrors};
use serde_json::Value;
use std::collections::HashMap;

/// Key the payload-shape errors aggregate under
const REQUEST_KEY: &str = "_request";

/// Submitted value for a field, accepting the API key or the storage
/// attribute as the payload key
fn submitted<'a>(data: &'a HashMap<String, Value>, field: &Field) -> Option<&'a Value> {
	data.get(field.key()).or_else(|| data.get(field.attribute()))
}

/// Reduce a payload to the storage attributes writable in this view.
///
/// Only fields visible in the view and not readonly contribute. Morph
/// fields contribute their type/id attribute pair, accepting either the
/// split sub-attribute keys or a `{type, id}` object under the field key.
pub fn extract_fillable(
	fields: &[Field],
	view: View,
	primary_key: &str,
	data: &HashMap<String, Value>,
) -> HashMap<String, Value> {
	let ctx = FieldContext::for_view(view);
	let mut fillable = HashMap::new();
	for field in fields {
		if field.is_readonly() || !field.visible_in(view, &ctx) {
			continue;
		}
		if field.field_type() == FieldType::MorphTo {
			extract_morph(field, data, &mut fillable);
			continue;
		}
		// relation kinds without a storage column on this table
		if matches!(
			field.field_type(),
			FieldType::HasMany | FieldType::BelongsToMany | FieldType::MorphToMany
		) {
			continue;
		}
		if let Some(value) = submitted(data, field) {
			fillable.insert(field.attribute().to_string(), value.clone());
		}
	}
	fillable.remove(primary_key);
	fillable
}

fn extract_morph(field: &Field, data: &HashMap<String, Value>, out: &mut HashMap<String, Value>) {
	let Some(relation) = field.relation() else { return };
	let (Some(type_attr), Some(id_attr)) =
		(relation.morph_type_attribute.clone(), relation.morph_id_attribute.clone())
	else {
		return;
	};
	// `{type, id}` object under the field key
	if let Some(Value::Object(pair)) = data.get(field.key()) {
		if let Some(morph_type) = pair.get("type") {
			out.insert(type_attr.clone(), morph_type.clone());
		}
		if let Some(morph_id) = pair.get("id") {
			out.insert(id_attr.clone(), morph_id.clone());
		}
		return;
	}
	// split sub-attribute keys
	if let Some(morph_type) = data.get(&type_attr) {
		out.insert(type_attr.clone(), morph_type.clone());
	}
	if let Some(morph_id) = data.get(&id_attr) {
		out.insert(id_attr, morph_id.clone());
	}
}

/// Payload-shape limits, checked before any per-field rule
fn check_limits(data: &HashMap<String, Value>, errors: &mut ValidationErrors) {
	if data.len() > limits::MAX_MUTATION_FIELDS {
		errors.add(
			REQUEST_KEY,
			format!(
				"The request may not contain more than {} fields",
				limits::MAX_MUTATION_FIELDS
			),
		);
	}
	for (key, value) in data {
		if let Value::String(text) = value {
			if text.len() > limits::MAX_STRING_LENGTH {
				errors.add(key, format!("The {key} field value is too large"));
			}
		}
	}
}

/// Validate a mutation payload for one view and hand back the writable
/// attribute map.
///
/// Every failing rule lands in the error bag under its field key; morph
/// fields check their type and id sub-attributes independently.
pub fn validate_mutation(
	fields: &[Field],
	view: View,
	primary_key: &str,
	data: &HashMap<String, Value>,
) -> AdminResult<HashMap<String, Value>> {
	let mut errors = ValidationErrors::new();
	check_limits(data, &mut errors);

	let ctx = FieldContext::for_view(view);
	for field in fields {
		if field.is_readonly() || !field.visible_in(view, &ctx) {
			continue;
		}
		if field.field_type() == FieldType::MorphTo {
			validate_morph(field, view, data, &mut errors);
			continue;
		}
		// on update, omitting a field means "leave unchanged"; required
		// rules only bite when the key is absent on creation
		let value = submitted(data, field);
		if view == View::Update && value.is_none() {
			continue;
		}
		for message in field.validate(value) {
			errors.add(field.key(), message);
		}
	}

	if errors.is_empty() {
		Ok(extract_fillable(fields, view, primary_key, data))
	} else {
		Err(AdminError::Validation(errors))
	}
}

fn validate_morph(
	field: &Field,
	view: View,
	data: &HashMap<String, Value>,
	errors: &mut ValidationErrors,
) {
	let Some(relation) = field.relation() else { return };
	let (Some(type_attr), Some(id_attr)) =
		(relation.morph_type_attribute.as_deref(), relation.morph_id_attribute.as_deref())
	else {
		return;
	};
	let pair = match data.get(field.key()) {
		Some(Value::Object(pair)) => Some(pair),
		_ => None,
	};
	let morph_type = pair
		.and_then(|p| p.get("type"))
		.or_else(|| data.get(type_attr));
	let morph_id = pair.and_then(|p| p.get("id")).or_else(|| data.get(id_attr));

	// an absent pair on update means "leave unchanged"
	if view == View::Update && morph_type.is_none() && morph_id.is_none() {
		return;
	}
	if field.is_required() {
		if morph_type.is_none_or(Value::is_null) {
			errors.add(type_attr, format!("The {} type is required", field.label()));
		}
		if morph_id.is_none_or(Value::is_null) {
			errors.add(id_attr, format!("The {} target is required", field.label()));
		}
	}
	if let Some(morph_type) = morph_type.filter(|v| !v.is_null()) {
		let known = morph_type
			.as_str()
			.is_some_and(|alias| relation.morph_targets.contains_key(alias));
		if !relation.morph_targets.is_empty() && !known {
			errors.add(type_attr, format!("The selected {} type is invalid", field.label()));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use grappelli_core::fields::{Field, Rule};

	fn fields() -> Vec<Field> {
		vec![
			Field::text("Title", "title").with_rules(vec![Rule::Required, Rule::Max(10)]),
			Field::number("Views", "views").readonly(),
			Field::text("Slug", "slug").hide_on_creation(),
		]
	}

	fn data(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
	}

	#[test]
	fn fillable_drops_readonly_hidden_and_primary_key() {
		let payload = data(&[
			("title", serde_json::json!("Hi")),
			("views", serde_json::json!(99)),
			("slug", serde_json::json!("hi")),
			("id", serde_json::json!(1)),
		]);
		let fillable = extract_fillable(&fields(), View::Creation, "id", &payload);

		assert_eq!(fillable.len(), 1);
		assert_eq!(fillable["title"], serde_json::json!("Hi"));
	}

	#[test]
	fn update_view_accepts_partial_payloads() {
		let payload = data(&[("slug", serde_json::json!("new-slug"))]);
		// title is required but absent; on update that means unchanged
		let fillable = validate_mutation(&fields(), View::Update, "id", &payload).unwrap();
		assert_eq!(fillable["slug"], serde_json::json!("new-slug"));
	}

	#[test]
	fn creation_aggregates_errors_per_field() {
		let payload = data(&[("title", serde_json::json!("way too long a title"))]);
		let err = validate_mutation(&fields(), View::Creation, "id", &payload).unwrap_err();
		let AdminError::Validation(errors) = err else { panic!("expected validation error") };
		assert_eq!(errors.get("title").len(), 1);
	}

	#[test]
	fn morph_fields_validate_both_sub_attributes() {
		let morph = vec![Field::morph_to("Commentable", "commentable")
			.morph_target("post", "posts", Some("posts".into()), "Post")
			.required()];

		let err = validate_mutation(&morph, View::Creation, "id", &HashMap::new()).unwrap_err();
		let AdminError::Validation(errors) = err else { panic!("expected validation error") };
		assert!(!errors.get("commentable_type").is_empty());
		assert!(!errors.get("commentable_id").is_empty());

		let payload = data(&[(
			"commentable",
			serde_json::json!({"type": "video", "id": 3}),
		)]);
		let err = validate_mutation(&morph, View::Creation, "id", &payload).unwrap_err();
		let AdminError::Validation(errors) = err else { panic!("expected validation error") };
		assert!(!errors.get("commentable_type").is_empty());
		assert!(errors.get("commentable_id").is_empty());
	}

	#[test]
	fn morph_object_payload_extracts_the_attribute_pair() {
		let morph = vec![Field::morph_to("Commentable", "commentable")];
		let payload = data(&[(
			"commentable",
			serde_json::json!({"type": "post", "id": 7}),
		)]);
		let fillable = extract_fillable(&morph, View::Creation, "id", &payload);

		assert_eq!(fillable["commentable_type"], serde_json::json!("post"));
		assert_eq!(fillable["commentable_id"], serde_json::json!(7));
	}

	#[test]
	fn oversized_payloads_are_rejected() {
		let mut payload = HashMap::new();
		for i in 0..(limits::MAX_MUTATION_FIELDS + 1) {
			payload.insert(format!("f{i}"), serde_json::json!(1));
		}
		let err = validate_mutation(&fields(), View::Update, "id", &payload).unwrap_err();
		assert!(matches!(err, AdminError::Validation(_)));
	}
}
