//! Column-bound filters: equality, range, boolean, static select

use super::{derive_key, Filter, FilterPayload, FilterScope};
use crate::database::json_to_sea_value;
use grappelli_types::{FilterDescriptor, FilterOption};
use sea_query::{Alias, Expr, ExprTrait, SelectStatement};
use serde_json::Value;

/// Default filter: equality on a storage column, `IN` for list payloads
pub struct ColumnFilter {
	name: String,
	key: Option<String>,
	column: String,
}

impl ColumnFilter {
	pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
		Self { name: name.into(), key: None, column: column.into() }
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}
}

impl Filter for ColumnFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	fn field(&self) -> Option<&str> {
		Some(&self.column)
	}

	fn apply(&self, query: &mut SelectStatement, _scope: &FilterScope, payload: &FilterPayload) {
		if payload.is_blank() {
			return;
		}
		let values = payload.list();
		match values.len() {
			0 => {}
			1 => {
				query.and_where(
					Expr::col(Alias::new(&self.column)).eq(json_to_sea_value(&values[0])),
				);
			}
			_ => {
				query.and_where(
					Expr::col(Alias::new(&self.column))
						.is_in(values.iter().map(json_to_sea_value)),
				);
			}
		}
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		vec![FilterDescriptor {
			name: self.name.clone(),
			key: self.key(),
			filter_type: "text".into(),
			component: "text-filter".into(),
			field: Some(self.column.clone()),
			options: Vec::new(),
			endpoint: None,
			multiple: false,
			depends_on: Vec::new(),
			soft_depends_on: Vec::new(),
		}]
	}
}

/// Value shape of a range filter, driving the frontend component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
	Generic,
	Date,
	Number,
}

impl RangeKind {
	fn component(&self) -> &'static str {
		match self {
			RangeKind::Generic => "range-filter",
			RangeKind::Date => "date-range-filter",
			RangeKind::Number => "number-range-filter",
		}
	}
}

/// Range filter over one column
///
/// Accepts `{start, end}` or a positional two-element array. Both bounds
/// present applies an inclusive `BETWEEN`, only a start applies `>=`, only
/// an end applies `<=`, neither is a no-op. Split request keys
/// `{field}_from`/`{field}_to` are reconstructed into `{start, end}` by
/// the pipeline's normalization step before this filter runs.
pub struct RangeFilter {
	name: String,
	key: Option<String>,
	column: String,
	kind: RangeKind,
}

impl RangeFilter {
	pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
		Self { name: name.into(), key: None, column: column.into(), kind: RangeKind::Generic }
	}

	pub fn date(name: impl Into<String>, column: impl Into<String>) -> Self {
		Self { kind: RangeKind::Date, ..Self::new(name, column) }
	}

	pub fn number(name: impl Into<String>, column: impl Into<String>) -> Self {
		Self { kind: RangeKind::Number, ..Self::new(name, column) }
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}
}

impl Filter for RangeFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	fn field(&self) -> Option<&str> {
		Some(&self.column)
	}

	fn apply(&self, query: &mut SelectStatement, _scope: &FilterScope, payload: &FilterPayload) {
		let column = || Expr::col(Alias::new(&self.column));
		match payload.bounds() {
			(Some(start), Some(end)) => {
				query.and_where(
					column().between(json_to_sea_value(&start), json_to_sea_value(&end)),
				);
			}
			(Some(start), None) => {
				query.and_where(column().gte(json_to_sea_value(&start)));
			}
			(None, Some(end)) => {
				query.and_where(column().lte(json_to_sea_value(&end)));
			}
			(None, None) => {}
		}
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		vec![FilterDescriptor {
			name: self.name.clone(),
			key: self.key(),
			filter_type: "range".into(),
			component: self.kind.component().into(),
			field: Some(self.column.clone()),
			options: Vec::new(),
			endpoint: None,
			multiple: false,
			depends_on: Vec::new(),
			soft_depends_on: Vec::new(),
		}]
	}
}

/// Boolean filter with configurable raw database representations
///
/// Storage is not assumed to hold SQL booleans: legacy schemas keep flags
/// as `'Y'`/`'N'` or `1`/`0`, so both branch values are configurable.
pub struct BooleanFilter {
	name: String,
	key: Option<String>,
	column: String,
	true_value: Value,
	false_value: Value,
}

impl BooleanFilter {
	pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			key: None,
			column: column.into(),
			true_value: Value::Bool(true),
			false_value: Value::Bool(false),
		}
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Raw database values written for the true and false branches
	pub fn with_values(mut self, true_value: Value, false_value: Value) -> Self {
		self.true_value = true_value;
		self.false_value = false_value;
		self
	}
}

impl Filter for BooleanFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	fn field(&self) -> Option<&str> {
		Some(&self.column)
	}

	fn apply(&self, query: &mut SelectStatement, _scope: &FilterScope, payload: &FilterPayload) {
		let raw = match payload.lenient_bool() {
			Some(true) => &self.true_value,
			Some(false) => &self.false_value,
			None => return,
		};
		query.and_where(Expr::col(Alias::new(&self.column)).eq(json_to_sea_value(raw)));
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		vec![FilterDescriptor {
			name: self.name.clone(),
			key: self.key(),
			filter_type: "boolean".into(),
			component: "boolean-filter".into(),
			field: Some(self.column.clone()),
			options: Vec::new(),
			endpoint: None,
			multiple: false,
			depends_on: Vec::new(),
			soft_depends_on: Vec::new(),
		}]
	}
}

/// Select filter over a static option list
pub struct SelectFilter {
	name: String,
	key: Option<String>,
	column: String,
	options: Vec<FilterOption>,
	multiple: bool,
}

impl SelectFilter {
	pub fn new(
		name: impl Into<String>,
		column: impl Into<String>,
		options: Vec<FilterOption>,
	) -> Self {
		Self { name: name.into(), key: None, column: column.into(), options, multiple: false }
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	pub fn multiple(mut self) -> Self {
		self.multiple = true;
		self
	}
}

impl Filter for SelectFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	fn field(&self) -> Option<&str> {
		Some(&self.column)
	}

	fn apply(&self, query: &mut SelectStatement, _scope: &FilterScope, payload: &FilterPayload) {
		if payload.is_blank() {
			return;
		}
		let values = payload.list();
		match values.len() {
			0 => {}
			1 => {
				query.and_where(
					Expr::col(Alias::new(&self.column)).eq(json_to_sea_value(&values[0])),
				);
			}
			_ => {
				query.and_where(
					Expr::col(Alias::new(&self.column))
						.is_in(values.iter().map(json_to_sea_value)),
				);
			}
		}
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		vec![FilterDescriptor {
			name: self.name.clone(),
			key: self.key(),
			filter_type: "select".into(),
			component: "select-filter".into(),
			field: Some(self.column.clone()),
			options: self.options.clone(),
			endpoint: None,
			multiple: self.multiple,
			depends_on: Vec::new(),
			soft_depends_on: Vec::new(),
		}]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sea_query::{PostgresQueryBuilder, Query};

	fn base_query() -> SelectStatement {
		Query::select()
			.from(Alias::new("posts"))
			.column(sea_query::Asterisk)
			.to_owned()
	}

	fn scope() -> FilterScope {
		FilterScope::new("posts", "id")
	}

	fn render(query: &SelectStatement) -> String {
		query.to_string(PostgresQueryBuilder)
	}

	#[test]
	fn column_filter_applies_equality_and_in() {
		let filter = ColumnFilter::new("Status", "status");

		let mut query = base_query();
		filter.apply(&mut query, &scope(), &FilterPayload::new(serde_json::json!("draft")));
		assert!(render(&query).contains(r#""status" = 'draft'"#));

		let mut query = base_query();
		filter.apply(
			&mut query,
			&scope(),
			&FilterPayload::new(serde_json::json!(["draft", "published"])),
		);
		assert!(render(&query).contains(r#""status" IN ('draft', 'published')"#));
	}

	#[test]
	fn blank_payloads_leave_the_query_unchanged() {
		let filter = ColumnFilter::new("Status", "status");
		let before = render(&base_query());

		for payload in [serde_json::json!(null), serde_json::json!(""), serde_json::json!([])] {
			let mut query = base_query();
			filter.apply(&mut query, &scope(), &FilterPayload::new(payload));
			assert_eq!(render(&query), before);
		}
	}

	#[test]
	fn range_filter_selects_between_gte_lte_or_nothing() {
		let filter = RangeFilter::number("Price", "price");

		let mut query = base_query();
		filter.apply(
			&mut query,
			&scope(),
			&FilterPayload::new(serde_json::json!({"start": 10, "end": 20})),
		);
		assert!(render(&query).contains(r#""price" BETWEEN 10 AND 20"#));

		let mut query = base_query();
		filter.apply(&mut query, &scope(), &FilterPayload::new(serde_json::json!({"start": 10})));
		assert!(render(&query).contains(r#""price" >= 10"#));

		let mut query = base_query();
		filter.apply(&mut query, &scope(), &FilterPayload::new(serde_json::json!({"end": 20})));
		assert!(render(&query).contains(r#""price" <= 20"#));

		let mut query = base_query();
		filter.apply(&mut query, &scope(), &FilterPayload::new(serde_json::json!({})));
		assert_eq!(render(&query), render(&base_query()));
	}

	#[test]
	fn boolean_filter_writes_the_configured_raw_values() {
		let filter = BooleanFilter::new("Active", "active")
			.with_values(serde_json::json!("Y"), serde_json::json!("N"));

		let mut query = base_query();
		filter.apply(&mut query, &scope(), &FilterPayload::new(serde_json::json!("1")));
		assert!(render(&query).contains(r#""active" = 'Y'"#));

		let mut query = base_query();
		filter.apply(&mut query, &scope(), &FilterPayload::new(serde_json::json!(false)));
		assert!(render(&query).contains(r#""active" = 'N'"#));

		let mut query = base_query();
		filter.apply(&mut query, &scope(), &FilterPayload::new(serde_json::json!("maybe")));
		assert_eq!(render(&query), render(&base_query()));
	}

	#[test]
	fn select_filter_serializes_its_options() {
		let filter = SelectFilter::new(
			"Status",
			"status",
			vec![
				FilterOption { value: serde_json::json!("draft"), label: "Draft".into() },
				FilterOption { value: serde_json::json!("published"), label: "Published".into() },
			],
		)
		.multiple();

		let descriptors = filter.descriptors();
		assert_eq!(descriptors.len(), 1);
		assert_eq!(descriptors[0].options.len(), 2);
		assert!(descriptors[0].multiple);
	}
}
