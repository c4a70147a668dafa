//! Relation-aware filters: dynamic select, relation existence, morph

use super::{derive_key, Filter, FilterPayload, FilterScope};
use crate::database::json_to_sea_value;
use crate::fields::{RelationConfig, RelationKind};
use grappelli_types::{FilterDescriptor, FilterOption};
use sea_query::{Alias, Expr, ExprTrait, Query, SelectStatement, SimpleExpr};
use serde_json::Value;
use std::sync::Arc;

/// Callback narrowing an existence subquery with extra constraints
pub type SubqueryConstraint = Arc<dyn Fn(&mut SelectStatement) + Send + Sync>;

/// Foreign key pointing back at the filtered table, for relations that
/// store it on the related side. Falls back to `{table minus trailing
/// s}_id` when not configured.
fn parent_foreign_key(scope: &FilterScope, relation: &RelationConfig) -> String {
	if let Some(fk) = &relation.foreign_key {
		return fk.clone();
	}
	let singular = scope.table.strip_suffix('s').unwrap_or(&scope.table);
	format!("{singular}_id")
}

/// Build the query constraint matching related rows by ID.
///
/// Belongs-to filters directly on the foreign key column; has-many goes
/// through an existence subquery on the related table; pivot kinds go
/// through an existence subquery on the pivot. Returns `None` when the
/// relation is missing the metadata the constraint needs, which the
/// caller treats as a no-op.
fn relation_constraint(
	scope: &FilterScope,
	relation: &RelationConfig,
	ids: &[Value],
) -> Option<SimpleExpr> {
	if ids.is_empty() {
		return None;
	}
	let id_values = || ids.iter().map(json_to_sea_value);
	match relation.kind {
		RelationKind::BelongsTo | RelationKind::MorphTo => {
			let column = Expr::col((
				Alias::new(&scope.table),
				Alias::new(relation.foreign_key_column()),
			));
			Some(if ids.len() == 1 {
				column.eq(json_to_sea_value(&ids[0]))
			} else {
				column.is_in(id_values())
			})
		}
		RelationKind::HasMany => {
			let related = relation.related_table.as_deref()?;
			let fk = parent_foreign_key(scope, relation);
			let subquery = Query::select()
				.expr(Expr::cust("1"))
				.from(Alias::new(related))
				.and_where(
					Expr::col((Alias::new(related), Alias::new(fk))).equals((
						Alias::new(&scope.table),
						Alias::new(&scope.primary_key),
					)),
				)
				.and_where(
					Expr::col((Alias::new(related), Alias::new(&relation.owner_key)))
						.is_in(id_values()),
				)
				.to_owned();
			Some(Expr::exists(subquery))
		}
		RelationKind::BelongsToMany | RelationKind::MorphToMany | RelationKind::MorphedByMany => {
			let pivot = relation.pivot_table.as_deref()?;
			let pivot_fk = relation.pivot_foreign_key.as_deref()?;
			let pivot_rk = relation.pivot_related_key.as_deref()?;
			let subquery = Query::select()
				.expr(Expr::cust("1"))
				.from(Alias::new(pivot))
				.and_where(
					Expr::col((Alias::new(pivot), Alias::new(pivot_fk))).equals((
						Alias::new(&scope.table),
						Alias::new(&scope.primary_key),
					)),
				)
				.and_where(
					Expr::col((Alias::new(pivot), Alias::new(pivot_rk))).is_in(id_values()),
				)
				.to_owned();
			Some(Expr::exists(subquery))
		}
	}
}

/// Select filter whose options come from an endpoint at display time
pub struct DynamicSelectFilter {
	name: String,
	key: Option<String>,
	column: Option<String>,
	endpoint: String,
	multiple: bool,
	depends_on: Vec<String>,
	soft_depends_on: Vec<String>,
	relation: Option<RelationConfig>,
}

impl DynamicSelectFilter {
	pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			key: None,
			column: None,
			endpoint: endpoint.into(),
			multiple: false,
			depends_on: Vec::new(),
			soft_depends_on: Vec::new(),
			relation: None,
		}
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Constrain a storage column directly with the selected values
	pub fn with_column(mut self, column: impl Into<String>) -> Self {
		self.column = Some(column.into());
		self
	}

	/// Constrain through relation existence instead of a direct column
	pub fn with_relation(mut self, relation: RelationConfig) -> Self {
		self.relation = Some(relation);
		self
	}

	pub fn multiple(mut self) -> Self {
		self.multiple = true;
		self
	}

	/// Filter keys this filter resets on (hard dependency)
	pub fn with_depends_on(mut self, keys: Vec<impl Into<String>>) -> Self {
		self.depends_on = keys.into_iter().map(Into::into).collect();
		self
	}

	/// Filter keys this filter refreshes on without resetting
	pub fn with_soft_depends_on(mut self, keys: Vec<impl Into<String>>) -> Self {
		self.soft_depends_on = keys.into_iter().map(Into::into).collect();
		self
	}
}

impl Filter for DynamicSelectFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	fn field(&self) -> Option<&str> {
		self.column.as_deref()
	}

	fn apply(&self, query: &mut SelectStatement, scope: &FilterScope, payload: &FilterPayload) {
		if payload.is_blank() {
			return;
		}
		let values = payload.list();
		if let Some(relation) = &self.relation {
			if let Some(constraint) = relation_constraint(scope, relation, &values) {
				query.and_where(constraint);
			}
			return;
		}
		let Some(column) = &self.column else { return };
		match values.len() {
			0 => {}
			1 => {
				query.and_where(Expr::col(Alias::new(column)).eq(json_to_sea_value(&values[0])));
			}
			_ => {
				query.and_where(
					Expr::col(Alias::new(column)).is_in(values.iter().map(json_to_sea_value)),
				);
			}
		}
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		vec![FilterDescriptor {
			name: self.name.clone(),
			key: self.key(),
			filter_type: "dynamic_select".into(),
			component: "dynamic-select-filter".into(),
			field: self.column.clone(),
			options: Vec::new(),
			endpoint: Some(self.endpoint.clone()),
			multiple: self.multiple,
			depends_on: self.depends_on.clone(),
			soft_depends_on: self.soft_depends_on.clone(),
		}]
	}
}

/// Filter matching records by related-row ID
pub struct RelationFilter {
	name: String,
	key: Option<String>,
	relation: RelationConfig,
	foreign_key_column: String,
}

impl RelationFilter {
	pub fn new(name: impl Into<String>, relation: RelationConfig) -> Self {
		let foreign_key_column = relation.foreign_key_column();
		Self { name: name.into(), key: None, relation, foreign_key_column }
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}
}

impl Filter for RelationFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	fn field(&self) -> Option<&str> {
		matches!(self.relation.kind, RelationKind::BelongsTo)
			.then_some(self.foreign_key_column.as_str())
	}

	fn apply(&self, query: &mut SelectStatement, scope: &FilterScope, payload: &FilterPayload) {
		if payload.is_blank() {
			return;
		}
		if let Some(constraint) = relation_constraint(scope, &self.relation, &payload.list()) {
			query.and_where(constraint);
		}
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		let endpoint = self
			.relation
			.related_resource
			.as_ref()
			.map(|key| format!("/{key}/options"));
		vec![FilterDescriptor {
			name: self.name.clone(),
			key: self.key(),
			filter_type: "relation".into(),
			component: "dynamic-select-filter".into(),
			field: self.field().map(str::to_string),
			options: Vec::new(),
			endpoint,
			multiple: true,
			depends_on: Vec::new(),
			soft_depends_on: Vec::new(),
		}]
	}
}

/// Presence filter over a relation: truthy keeps records with at least one
/// related row, falsy keeps records with none, anything else is a no-op
pub struct ExistsFilter {
	name: String,
	key: Option<String>,
	relation: RelationConfig,
	constraint: Option<SubqueryConstraint>,
}

impl ExistsFilter {
	pub fn new(name: impl Into<String>, relation: RelationConfig) -> Self {
		Self { name: name.into(), key: None, relation, constraint: None }
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Narrow the existence subquery with extra conditions
	pub fn with_constraint(mut self, constraint: SubqueryConstraint) -> Self {
		self.constraint = Some(constraint);
		self
	}

	fn existence_subquery(&self, scope: &FilterScope) -> Option<SelectStatement> {
		let (table, outer_column, inner_column) = match self.relation.kind {
			RelationKind::HasMany => (
				self.relation.related_table.clone()?,
				scope.primary_key.clone(),
				parent_foreign_key(scope, &self.relation),
			),
			RelationKind::BelongsTo | RelationKind::MorphTo => (
				self.relation.related_table.clone()?,
				self.relation.foreign_key_column(),
				self.relation.owner_key.clone(),
			),
			RelationKind::BelongsToMany
			| RelationKind::MorphToMany
			| RelationKind::MorphedByMany => (
				self.relation.pivot_table.clone()?,
				scope.primary_key.clone(),
				self.relation.pivot_foreign_key.clone()?,
			),
		};
		let mut subquery = Query::select()
			.expr(Expr::cust("1"))
			.from(Alias::new(&table))
			.and_where(Expr::col((Alias::new(&table), Alias::new(inner_column))).equals((
				Alias::new(&scope.table),
				Alias::new(outer_column),
			)))
			.to_owned();
		if let Some(constraint) = &self.constraint {
			constraint(&mut subquery);
		}
		Some(subquery)
	}
}

impl Filter for ExistsFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	fn apply(&self, query: &mut SelectStatement, scope: &FilterScope, payload: &FilterPayload) {
		let Some(wanted) = payload.lenient_bool() else { return };
		let Some(subquery) = self.existence_subquery(scope) else { return };
		if wanted {
			query.and_where(Expr::exists(subquery));
		} else {
			query.and_where(Expr::exists(subquery).not());
		}
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		vec![FilterDescriptor {
			name: self.name.clone(),
			key: self.key(),
			filter_type: "exists".into(),
			component: "boolean-filter".into(),
			field: None,
			options: Vec::new(),
			endpoint: None,
			multiple: false,
			depends_on: Vec::new(),
			soft_depends_on: Vec::new(),
		}]
	}
}

/// Polymorphic filter expanding into two transport filters
///
/// One logical definition produces a type selector over the configured
/// alias map plus an entity selector that hard-depends on the type. The
/// entity selector's endpoint carries a literal `{morphType}` placeholder
/// the client substitutes with the selected alias's resource key, so the
/// option fetch is scoped to the related resource rather than the parent.
pub struct MorphFilter {
	name: String,
	key: Option<String>,
	relation: RelationConfig,
}

impl MorphFilter {
	pub fn new(name: impl Into<String>, relation: RelationConfig) -> Self {
		Self { name: name.into(), key: None, relation }
	}

	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	fn type_key(&self) -> String {
		format!("{}_type", self.key())
	}

	fn id_key(&self) -> String {
		format!("{}_id", self.key())
	}
}

impl Filter for MorphFilter {
	fn name(&self) -> &str {
		&self.name
	}

	fn key(&self) -> String {
		self.key.clone().unwrap_or_else(|| derive_key(&self.name))
	}

	/// Payload is the `{type, id}` object the pipeline reassembles from
	/// the two transport keys; either half may be absent.
	fn apply(&self, query: &mut SelectStatement, _scope: &FilterScope, payload: &FilterPayload) {
		let Value::Object(parts) = payload.raw() else { return };
		if let Some(morph_type) = parts.get("type").filter(|v| !v.is_null()) {
			if let Some(column) = &self.relation.morph_type_attribute {
				query.and_where(
					Expr::col(Alias::new(column)).eq(json_to_sea_value(morph_type)),
				);
			}
		}
		if let Some(morph_id) = parts.get("id").filter(|v| !v.is_null()) {
			if let Some(column) = &self.relation.morph_id_attribute {
				query.and_where(Expr::col(Alias::new(column)).eq(json_to_sea_value(morph_id)));
			}
		}
	}

	fn descriptors(&self) -> Vec<FilterDescriptor> {
		let type_options: Vec<FilterOption> = self
			.relation
			.morph_targets
			.iter()
			.map(|(alias, target)| FilterOption {
				value: Value::String(alias.clone()),
				label: target.label.clone(),
			})
			.collect();
		vec![
			FilterDescriptor {
				name: format!("{} Type", self.name),
				key: self.type_key(),
				filter_type: "select".into(),
				component: "select-filter".into(),
				field: self.relation.morph_type_attribute.clone(),
				options: type_options,
				endpoint: None,
				multiple: false,
				depends_on: Vec::new(),
				soft_depends_on: Vec::new(),
			},
			FilterDescriptor {
				name: self.name.clone(),
				key: self.id_key(),
				filter_type: "dynamic_select".into(),
				component: "dynamic-select-filter".into(),
				field: self.relation.morph_id_attribute.clone(),
				options: Vec::new(),
				endpoint: Some("/{morphType}/options".into()),
				multiple: false,
				depends_on: vec![self.type_key()],
				soft_depends_on: Vec::new(),
			},
		]
	}
}
