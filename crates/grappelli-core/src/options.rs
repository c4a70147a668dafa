//! Field option resolution
//!
//! Relation fields expose a `{value, label}` option list for their select
//! components. Resolution is polymorphic over the relation kind through
//! priority-ordered strategies; morph-to fields take a dedicated path
//! keyed on the `morphType` request parameter because they have no single
//! related model.

use crate::database::{json_to_sea_value, Database};
use crate::fields::{Field, FieldContext, RelationConfig, RelationKind};
use crate::filters::{FilterPayload, FilterScope};
use crate::registry::ResourceRegistry;
use crate::resource::{Resource, ResourceExt};
use crate::util::like_contains;
use async_trait::async_trait;
use grappelli_types::{AdminError, AdminResult, OptionItem, OptionsQuery, SortDirection};
use sea_query::{Alias, Asterisk, Condition, Expr, ExprTrait, Order, Query};
use serde_json::Value;
use std::sync::Arc;

use crate::config::limits;

/// Attributes scanned for a display label when nothing is configured
pub const FALLBACK_LABEL_ATTRIBUTES: &[&str] =
	&["name", "title", "label", "display_name", "full_name", "description"];

/// Everything one option resolution needs
pub struct OptionsContext<'a> {
	pub registry: &'a ResourceRegistry,
	pub database: &'a Database,
	pub field: &'a Field,
	pub relation: &'a RelationConfig,
	pub request: &'a OptionsQuery,
	/// Page for the paginated variant; `None` is the plain limited fetch
	pub page: Option<u64>,
}

/// One way of resolving options for a relation kind
#[async_trait]
pub trait OptionsStrategy: Send + Sync {
	/// Selection priority; the highest handler wins
	fn priority(&self) -> u8;

	/// Whether this strategy can resolve options for the field
	fn handles(&self, field: &Field) -> bool;

	async fn resolve(&self, ctx: &OptionsContext<'_>) -> AdminResult<Vec<OptionItem>>;
}

fn relation_kind(field: &Field) -> Option<RelationKind> {
	field.relation().map(|r| r.kind)
}

/// Strategy for belongs-to fields
pub struct BelongsToOptions;

#[async_trait]
impl OptionsStrategy for BelongsToOptions {
	fn priority(&self) -> u8 {
		100
	}

	fn handles(&self, field: &Field) -> bool {
		relation_kind(field) == Some(RelationKind::BelongsTo)
	}

	async fn resolve(&self, ctx: &OptionsContext<'_>) -> AdminResult<Vec<OptionItem>> {
		fetch_related_options(ctx, None).await
	}
}

/// Strategy for belongs-to-many fields
pub struct BelongsToManyOptions;

#[async_trait]
impl OptionsStrategy for BelongsToManyOptions {
	fn priority(&self) -> u8 {
		80
	}

	fn handles(&self, field: &Field) -> bool {
		relation_kind(field) == Some(RelationKind::BelongsToMany)
	}

	async fn resolve(&self, ctx: &OptionsContext<'_>) -> AdminResult<Vec<OptionItem>> {
		fetch_related_options(ctx, None).await
	}
}

/// Strategy for morph-to-many and morphed-by-many fields
pub struct MorphToManyOptions;

#[async_trait]
impl OptionsStrategy for MorphToManyOptions {
	fn priority(&self) -> u8 {
		75
	}

	fn handles(&self, field: &Field) -> bool {
		matches!(
			relation_kind(field),
			Some(RelationKind::MorphToMany) | Some(RelationKind::MorphedByMany)
		)
	}

	async fn resolve(&self, ctx: &OptionsContext<'_>) -> AdminResult<Vec<OptionItem>> {
		fetch_related_options(ctx, None).await
	}
}

/// Fallback for any other relation field with a resolvable related table
pub struct DefaultOptions;

#[async_trait]
impl OptionsStrategy for DefaultOptions {
	fn priority(&self) -> u8 {
		0
	}

	fn handles(&self, field: &Field) -> bool {
		field
			.relation()
			.is_some_and(|r| r.kind != RelationKind::MorphTo)
	}

	async fn resolve(&self, ctx: &OptionsContext<'_>) -> AdminResult<Vec<OptionItem>> {
		fetch_related_options(ctx, None).await
	}
}

/// The built-in strategy set
pub fn default_strategies() -> Vec<Box<dyn OptionsStrategy>> {
	vec![
		Box::new(BelongsToOptions),
		Box::new(BelongsToManyOptions),
		Box::new(MorphToManyOptions),
		Box::new(DefaultOptions),
	]
}

/// What the related side of a resolution looks like
struct RelatedTarget {
	table: String,
	resource: Option<Arc<dyn Resource>>,
}

fn resolve_related(
	registry: &ResourceRegistry,
	relation: &RelationConfig,
) -> AdminResult<RelatedTarget> {
	let resource = relation.related_resource.as_deref().and_then(|key| registry.get(key));
	let table = relation
		.related_table
		.clone()
		.or_else(|| resource.as_ref().map(|r| r.table().to_string()))
		.ok_or_else(|| {
			AdminError::UnsupportedOperation(format!(
				"relation '{}' has no related table or registered resource",
				relation.name
			))
		})?;
	Ok(RelatedTarget { table, resource })
}

/// Shared option-fetch recipe every non-morph strategy runs
///
/// `target_override` lets the morph path substitute the per-alias target.
async fn fetch_related_options(
	ctx: &OptionsContext<'_>,
	target_override: Option<RelatedTarget>,
) -> AdminResult<Vec<OptionItem>> {
	let target = match target_override {
		Some(target) => target,
		None => resolve_related(ctx.registry, ctx.relation)?,
	};
	let primary_key = target
		.resource
		.as_ref()
		.map(|r| r.primary_key().to_string())
		.unwrap_or_else(|| "id".to_string());

	let mut query = Query::select()
		.from(Alias::new(&target.table))
		.column(Asterisk)
		.to_owned();

	if let Some(resource) = &target.resource {
		resource.options_query(&mut query);

		// submitted filters run against the related resource's filter set
		if !ctx.request.filters.is_empty() {
			let scope = FilterScope::new(&target.table, &primary_key);
			for filter in resource.all_filters(&FieldContext::empty())? {
				if let Some(value) = ctx.request.filters.get(&filter.key()) {
					if !value.is_null() {
						filter.apply(&mut query, &scope, &FilterPayload::new(value.clone()));
					}
				}
			}
		}
	}

	if let Some(term) = ctx.request.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
		let searchable = target
			.resource
			.as_ref()
			.map(|r| r.searchable_columns())
			.filter(|cols| !cols.is_empty())
			.unwrap_or_else(|| {
				FALLBACK_LABEL_ATTRIBUTES.iter().map(|s| s.to_string()).collect()
			});
		let mut condition = Condition::any();
		for column in searchable {
			condition = condition.add(Expr::col(Alias::new(column)).like(like_contains(term)));
		}
		query.cond_where(condition);
	}

	if !ctx.request.exclude.is_empty() {
		query.and_where(
			Expr::col(Alias::new(&primary_key))
				.is_in(ctx.request.exclude.iter().map(json_to_sea_value))
				.not(),
		);
	}

	let order_column = ctx
		.request
		.order_by
		.clone()
		.or_else(|| ctx.relation.display_attribute.clone())
		.unwrap_or_else(|| {
			target
				.resource
				.as_ref()
				.map(|r| r.title_attribute().to_string())
				.unwrap_or_else(|| primary_key.clone())
		});
	let order = match ctx.request.sort_direction.unwrap_or(SortDirection::Asc) {
		SortDirection::Asc => Order::Asc,
		SortDirection::Desc => Order::Desc,
	};
	query.order_by(Alias::new(order_column), order);

	let limit = ctx
		.request
		.limit
		.unwrap_or(limits::DEFAULT_OPTIONS_LIMIT)
		.clamp(1, limits::MAX_OPTIONS_LIMIT);
	query.limit(limit);
	if let Some(page) = ctx.page {
		query.offset((Ord::max(page, 1) - 1) * limit);
	}

	let rows = ctx.database.fetch_all(&query).await?;
	Ok(rows
		.into_iter()
		.map(|row| {
			let value = row.get(&primary_key).cloned().unwrap_or(Value::Null);
			let label = resolve_label(ctx.relation, target.resource.as_deref(), &row, &primary_key);
			OptionItem { value, label }
		})
		.collect())
}

/// Label priority: field display attribute, resource `display_label` hook
/// (via `record_label`), common-attribute scan, primary key
fn resolve_label(
	relation: &RelationConfig,
	resource: Option<&dyn Resource>,
	row: &grappelli_types::Record,
	primary_key: &str,
) -> String {
	if let Some(display) = &relation.display_attribute {
		if let Some(Value::String(text)) = row.get(display) {
			if !text.is_empty() {
				return text.clone();
			}
		}
	}
	if let Some(resource) = resource {
		return resource.record_label(row);
	}
	for attribute in FALLBACK_LABEL_ATTRIBUTES {
		if let Some(Value::String(text)) = row.get(*attribute) {
			if !text.is_empty() {
				return text.clone();
			}
		}
	}
	row.get(primary_key)
		.map(|id| match id {
			Value::String(s) => s.clone(),
			other => other.to_string(),
		})
		.unwrap_or_default()
}

/// Resolves option lists for relation fields
#[derive(Clone)]
pub struct OptionsService {
	registry: Arc<ResourceRegistry>,
	database: Database,
	strategies: Arc<Vec<Box<dyn OptionsStrategy>>>,
}

impl OptionsService {
	pub fn new(registry: Arc<ResourceRegistry>, database: Database) -> Self {
		Self { registry, database, strategies: Arc::new(default_strategies()) }
	}

	fn strategy_for(&self, field: &Field) -> Option<&dyn OptionsStrategy> {
		self.strategies
			.iter()
			.filter(|s| s.handles(field))
			.max_by_key(|s| s.priority())
			.map(|s| s.as_ref())
	}

	/// Options for one relation field, limited but unpaginated
	pub async fn field_options(
		&self,
		field: &Field,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		self.options(field, request, None).await
	}

	/// Paginated options for fields flagged `paginated`
	pub async fn paginated_field_options(
		&self,
		field: &Field,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		self.options(field, request, Some(request.page.unwrap_or(1))).await
	}

	async fn options(
		&self,
		field: &Field,
		request: &OptionsQuery,
		page: Option<u64>,
	) -> AdminResult<Vec<OptionItem>> {
		let relation = field.relation().ok_or_else(|| {
			AdminError::UnsupportedOperation(format!(
				"field '{}' is not a relation field",
				field.key()
			))
		})?;
		if relation.kind == RelationKind::MorphTo {
			return Err(AdminError::UnsupportedOperation(
				"morph_to options require a morphType parameter".into(),
			));
		}
		let strategy = self.strategy_for(field).ok_or_else(|| {
			AdminError::UnsupportedOperation(format!(
				"no options strategy handles relation kind '{}'",
				relation.kind.name()
			))
		})?;
		let ctx = OptionsContext {
			registry: &self.registry,
			database: &self.database,
			field,
			relation,
			request,
			page,
		};
		strategy.resolve(&ctx).await
	}

	/// Options for a morph-to field, scoped to one configured type alias
	pub async fn morph_options(
		&self,
		field: &Field,
		morph_type: &str,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		let relation = field.relation().filter(|r| r.kind == RelationKind::MorphTo).ok_or_else(
			|| {
				AdminError::UnsupportedOperation(format!(
					"field '{}' is not a morph_to field",
					field.key()
				))
			},
		)?;
		let target = relation.morph_targets.get(morph_type).ok_or_else(|| {
			AdminError::UnsupportedOperation(format!(
				"'{morph_type}' is not a configured type of relation '{}'",
				relation.name
			))
		})?;
		let resource = target.resource_key.as_deref().and_then(|key| self.registry.get(key));
		let ctx = OptionsContext {
			registry: &self.registry,
			database: &self.database,
			field,
			relation,
			request,
			page: None,
		};
		fetch_related_options(
			&ctx,
			Some(RelatedTarget { table: target.table.clone(), resource }),
		)
		.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::Field;

	#[test]
	fn highest_priority_handler_wins() {
		let strategies = default_strategies();
		let field = Field::belongs_to("Author", "author");

		let winner = strategies
			.iter()
			.filter(|s| s.handles(&field))
			.max_by_key(|s| s.priority())
			.unwrap();
		// belongs-to is handled by both BelongsToOptions and the default
		// fallback; the specific strategy must win
		assert_eq!(winner.priority(), 100);
	}

	#[test]
	fn morph_to_is_not_handled_by_any_strategy() {
		let strategies = default_strategies();
		let field = Field::morph_to("Commentable", "commentable");
		assert!(strategies.iter().all(|s| !s.handles(&field)));
	}

	#[test]
	fn fallback_attributes_match_the_documented_order() {
		assert_eq!(
			FALLBACK_LABEL_ATTRIBUTES,
			&["name", "title", "label", "display_name", "full_name", "description"]
		);
	}
}
