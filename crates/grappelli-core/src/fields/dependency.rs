//! Per-field dependency configuration
//!
//! Dependencies are declarative metadata only: the core records which
//! sibling fields a field observes and under which conditions it becomes
//! visible/disabled/required, then serializes the rule set for the client.
//! Cross-field conditions are never evaluated server-side for display
//! purposes, and required-conditions are not turned into validation rules.

use grappelli_types::{ConditionDescriptor, DependencyDescriptor, Operator, OptionsWiring};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier shape recognized inside compute formulas
static IDENTIFIER: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("identifier regex is valid"));

/// Math-function and keyword names excluded from formula field extraction
const RESERVED_WORDS: &[&str] = &[
	"abs", "min", "max", "round", "floor", "ceil", "sqrt", "pow", "sin", "cos", "tan", "log",
	"exp", "if", "then", "else", "and", "or", "not",
];

/// Which condition list a registration targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
	Visibility,
	Disabled,
	Required,
}

/// Mutable dependency state of one field
///
/// Created lazily on the first dependency-related call; a field that never
/// registers a dependency serializes with no dependency entry at all.
#[derive(Debug, Clone, Default)]
pub struct DependencyConfig {
	fields: Vec<String>,
	visibility: Vec<ConditionDescriptor>,
	disabled: Vec<ConditionDescriptor>,
	required: Vec<ConditionDescriptor>,
	options: Option<OptionsWiring>,
	compute: Option<String>,
	clear_on_change: bool,
	debounce: Option<u64>,
}

impl DependencyConfig {
	/// Record an observed field key, preserving declaration order
	pub fn observe(&mut self, field: &str) {
		if !self.fields.iter().any(|f| f == field) {
			self.fields.push(field.to_string());
		}
	}

	/// Observed field keys, in declaration order
	pub fn fields(&self) -> &[String] {
		&self.fields
	}

	/// Register a condition; its observed field is auto-added.
	///
	/// The comparison value is dropped for unary operators so the
	/// serialized rule never carries a meaningless payload.
	pub fn add_condition(
		&mut self,
		kind: ConditionKind,
		field: &str,
		operator: Operator,
		value: Option<Value>,
	) {
		self.observe(field);
		let condition = ConditionDescriptor {
			field: field.to_string(),
			operator,
			value: if operator.requires_value() { value } else { None },
		};
		match kind {
			ConditionKind::Visibility => self.visibility.push(condition),
			ConditionKind::Disabled => self.disabled.push(condition),
			ConditionKind::Required => self.required.push(condition),
		}
	}

	/// Wire dynamic/cascading option loads to the given endpoint.
	///
	/// Every parameter's source field is auto-observed.
	pub fn set_options(&mut self, endpoint: &str, params: BTreeMap<String, String>) {
		for source in params.values() {
			self.observe(source);
		}
		self.options = Some(OptionsWiring { endpoint: endpoint.to_string(), params });
	}

	/// Record a compute formula; referenced field keys are extracted
	/// best-effort from the formula text.
	pub fn set_compute(&mut self, formula: &str) {
		for field in extract_formula_fields(formula) {
			self.observe(&field);
		}
		self.compute = Some(formula.to_string());
	}

	/// Clear this field's value whenever an observed field changes
	pub fn set_clear_on_change(&mut self, clear: bool) {
		self.clear_on_change = clear;
	}

	/// Debounce reactions to observed changes
	pub fn set_debounce(&mut self, milliseconds: u64) {
		self.debounce = Some(milliseconds);
	}

	/// Serialized transport form
	pub fn descriptor(&self) -> DependencyDescriptor {
		DependencyDescriptor {
			fields: self.fields.clone(),
			visibility: self.visibility.clone(),
			disabled: self.disabled.clone(),
			required: self.required.clone(),
			options: self.options.clone(),
			compute: self.compute.clone(),
			clear_on_change: self.clear_on_change,
			debounce: self.debounce,
		}
	}
}

/// Extract candidate field keys from a compute formula.
///
/// Extraction is regex-based and best-effort: reserved math-function
/// words are skipped, anything else identifier-shaped is kept in first
/// appearance order, and malformed formulas simply yield fewer matches.
///
/// # Examples
///
/// ```
/// use grappelli_core::fields::extract_formula_fields;
///
/// let fields = extract_formula_fields("round(price * quantity) - discount");
/// assert_eq!(fields, vec!["price", "quantity", "discount"]);
/// ```
pub fn extract_formula_fields(formula: &str) -> Vec<String> {
	let mut seen = Vec::new();
	for capture in IDENTIFIER.find_iter(formula) {
		let word = capture.as_str();
		if RESERVED_WORDS.contains(&word) {
			continue;
		}
		if !seen.iter().any(|s| s == word) {
			seen.push(word.to_string());
		}
	}
	seen
}
