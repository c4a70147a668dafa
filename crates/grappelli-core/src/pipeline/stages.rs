//! The six pipeline stages

use super::{ListContext, OrderClause, Stage};
use crate::config::limits;
use crate::fields::{FieldContext, RelationKind, View};
use crate::filters::{FilterPayload, FilterScope};
use crate::registry::ResourceRegistry;
use crate::resource::{Resource, ResourceExt};
use crate::util::like_contains;
use async_trait::async_trait;
use grappelli_types::{
	AdminResult, IndexResponse, Record, RecordDescriptor, SortDirection, TrashedMode,
};
use sea_query::{Alias, Condition, Expr, ExprTrait, Order, Query, SimpleExpr};
use serde_json::Value;

/// Opens the base query: FROM, soft-delete scoping, field plan, eager-load
/// plan, and the resource's own index scope hook
pub struct BuildQuery;

#[async_trait]
impl Stage for BuildQuery {
	fn name(&self) -> &'static str {
		"build_query"
	}

	async fn process(&self, mut ctx: ListContext) -> AdminResult<ListContext> {
		let resource = ctx.resource.clone();
		ctx.query = Query::select().from(Alias::new(resource.table())).to_owned();

		if resource.soft_deletes() {
			let deleted_at = Expr::col(Alias::new(resource.deleted_at_column()));
			match ctx.request.trashed_mode() {
				TrashedMode::Without => {
					ctx.query.and_where(deleted_at.is_null());
				}
				TrashedMode::Only => {
					ctx.query.and_where(deleted_at.is_not_null());
				}
				TrashedMode::With => {}
			}
		}

		ctx.fields = resource.flat_fields(&FieldContext::for_view(View::Index))?;

		let mut columns = vec![resource.primary_key().to_string()];
		if resource.soft_deletes() {
			columns.push(resource.deleted_at_column().to_string());
		}
		for field in &ctx.fields {
			if field.applies_in_index_query() {
				let attribute = field.attribute().to_string();
				if !columns.contains(&attribute) {
					columns.push(attribute);
				}
			}
			if let Some(relation) = field.relation() {
				if relation.eager_loadable() {
					ctx.eager.push(relation.clone());
				}
			}
		}
		ctx.columns = columns;

		resource.index_query(&mut ctx.query);
		Ok(ctx)
	}
}

/// ORs a `LIKE %term%` over the searchable columns and relation paths
pub struct ApplySearch;

#[async_trait]
impl Stage for ApplySearch {
	fn name(&self) -> &'static str {
		"apply_search"
	}

	async fn process(&self, mut ctx: ListContext) -> AdminResult<ListContext> {
		let Some(term) = ctx.request.search.as_deref().map(str::trim).filter(|t| !t.is_empty())
		else {
			return Ok(ctx);
		};
		let resource = ctx.resource.clone();
		let table = resource.table();

		let mut condition = Condition::any();
		let mut clauses = 0usize;
		for column in resource.searchable_columns() {
			condition = condition.add(
				Expr::col((Alias::new(table), Alias::new(column))).like(like_contains(term)),
			);
			clauses += 1;
		}
		for path in resource.searchable_relations() {
			if let Some(expr) = search_relation_path(
				&ctx.registry,
				resource.as_ref(),
				table,
				resource.primary_key(),
				&path,
				term,
			) {
				condition = condition.add(expr);
				clauses += 1;
			}
		}
		if clauses > 0 {
			ctx.query.cond_where(condition);
		}
		Ok(ctx)
	}
}

/// Relation-existence search over a dot-notation path, recursing through
/// the registry for paths deeper than one hop. Unresolvable paths are
/// silently skipped.
fn search_relation_path(
	registry: &ResourceRegistry,
	resource: &dyn Resource,
	parent_table: &str,
	parent_pk: &str,
	path: &str,
	term: &str,
) -> Option<SimpleExpr> {
	let (head, rest) = path.split_once('.')?;
	let field = resource.field_by_key(&FieldContext::empty(), head).ok().flatten()?;
	let relation = field.relation()?.clone();
	let related_table = relation.related_table.clone().or_else(|| {
		let key = relation.related_resource.as_deref()?;
		Some(registry.get(key)?.table().to_string())
	})?;

	let inner: SimpleExpr = if rest.contains('.') {
		let related = registry.get(relation.related_resource.as_deref()?)?;
		search_relation_path(
			registry,
			related.as_ref(),
			&related_table,
			related.primary_key(),
			rest,
			term,
		)?
	} else {
		Expr::col((Alias::new(&related_table), Alias::new(rest))).like(like_contains(term))
	};

	match relation.kind {
		RelationKind::BelongsTo | RelationKind::MorphTo => {
			let subquery = Query::select()
				.expr(Expr::cust("1"))
				.from(Alias::new(&related_table))
				.and_where(
					Expr::col((Alias::new(&related_table), Alias::new(&relation.owner_key)))
						.equals((Alias::new(parent_table), Alias::new(relation.foreign_key_column()))),
				)
				.and_where(inner)
				.to_owned();
			Some(Expr::exists(subquery))
		}
		RelationKind::HasMany => {
			let child_fk = relation.foreign_key.clone().unwrap_or_else(|| {
				let singular = parent_table.strip_suffix('s').unwrap_or(parent_table);
				format!("{singular}_id")
			});
			let subquery = Query::select()
				.expr(Expr::cust("1"))
				.from(Alias::new(&related_table))
				.and_where(
					Expr::col((Alias::new(&related_table), Alias::new(child_fk)))
						.equals((Alias::new(parent_table), Alias::new(parent_pk))),
				)
				.and_where(inner)
				.to_owned();
			Some(Expr::exists(subquery))
		}
		RelationKind::BelongsToMany | RelationKind::MorphToMany | RelationKind::MorphedByMany => {
			let pivot = relation.pivot_table.as_deref()?;
			let pivot_fk = relation.pivot_foreign_key.as_deref()?;
			let pivot_rk = relation.pivot_related_key.as_deref()?;
			let matching_related = Query::select()
				.column((Alias::new(&related_table), Alias::new(&relation.owner_key)))
				.from(Alias::new(&related_table))
				.and_where(inner)
				.to_owned();
			let subquery = Query::select()
				.expr(Expr::cust("1"))
				.from(Alias::new(pivot))
				.and_where(
					Expr::col((Alias::new(pivot), Alias::new(pivot_fk)))
						.equals((Alias::new(parent_table), Alias::new(parent_pk))),
				)
				.and_where(
					Expr::col((Alias::new(pivot), Alias::new(pivot_rk)))
						.in_subquery(matching_related),
				)
				.to_owned();
			Some(Expr::exists(subquery))
		}
	}
}

/// Reassemble transport filter keys into the payload shapes filters
/// consume: `{base}_from`/`{base}_to` become `{start, end}` and
/// `{base}_type`/`{base}_id` become `{type, id}`, in both cases only when
/// `base` is a known filter key. Unknown keys are dropped.
pub fn normalize_filters(
	raw: &serde_json::Map<String, Value>,
	known_keys: &[String],
) -> serde_json::Map<String, Value> {
	const SPLITS: [(&str, &str); 4] =
		[("_from", "start"), ("_to", "end"), ("_type", "type"), ("_id", "id")];

	let mut normalized = serde_json::Map::new();
	'raw: for (key, value) in raw {
		if known_keys.iter().any(|k| k == key) {
			normalized.insert(key.clone(), value.clone());
			continue;
		}
		for (suffix, part) in SPLITS {
			if let Some(base) = key.strip_suffix(suffix) {
				if known_keys.iter().any(|k| k == base) {
					let entry = normalized
						.entry(base.to_string())
						.or_insert_with(|| Value::Object(serde_json::Map::new()));
					if let Value::Object(map) = entry {
						map.insert(part.to_string(), value.clone());
					}
					continue 'raw;
				}
			}
		}
		// not a filter key in any form; ignored
	}
	normalized
}

/// Dispatches each filter whose key has a non-null submitted value
pub struct ApplyFilters;

#[async_trait]
impl Stage for ApplyFilters {
	fn name(&self) -> &'static str {
		"apply_filters"
	}

	async fn process(&self, mut ctx: ListContext) -> AdminResult<ListContext> {
		if ctx.request.filters.is_empty() {
			return Ok(ctx);
		}
		let resource = ctx.resource.clone();
		let filters = resource.all_filters(&FieldContext::for_view(View::Index))?;

		let mut known_keys: Vec<String> = filters.iter().map(|f| f.key()).collect();
		for filter in &filters {
			if let Some(field) = filter.field() {
				if !known_keys.iter().any(|k| k == field) {
					known_keys.push(field.to_string());
				}
			}
		}
		let normalized = normalize_filters(&ctx.request.filters, &known_keys);

		let scope = FilterScope::new(resource.table(), resource.primary_key());
		for filter in &filters {
			let value = normalized
				.get(&filter.key())
				.or_else(|| filter.field().and_then(|f| normalized.get(f)));
			if let Some(value) = value.filter(|v| !v.is_null()) {
				filter.apply(&mut ctx.query, &scope, &FilterPayload::new(value.clone()));
			}
		}
		Ok(ctx)
	}
}

/// Resolves the sort key into a deferred order clause
pub struct ApplySorting;

#[async_trait]
impl Stage for ApplySorting {
	fn name(&self) -> &'static str {
		"apply_sorting"
	}

	async fn process(&self, mut ctx: ListContext) -> AdminResult<ListContext> {
		let direction = ctx.request.sort_direction.unwrap_or_default();

		if let Some(key) = ctx.request.sort_field.as_deref() {
			let field = ctx.fields.iter().find(|f| f.key() == key && f.is_sortable());
			if let Some(field) = field {
				match field.relation() {
					Some(relation) => {
						// relation-backed sort: correlated scalar subquery
						// on the related display column
						let resolved = relation
							.related_table
							.clone()
							.map(|table| {
								let display = relation
									.display_attribute
									.clone()
									.unwrap_or_else(|| "name".into());
								(table, display)
							})
							.or_else(|| {
								let key = relation.related_resource.as_deref()?;
								let related = ctx.registry.get(key)?;
								let display = relation
									.display_attribute
									.clone()
									.unwrap_or_else(|| related.title_attribute().to_string());
								Some((related.table().to_string(), display))
							});
						if let Some((related_table, display)) = resolved {
							let sql = correlated_display_sql(
								&related_table,
								&display,
								&relation.owner_key,
								ctx.resource.table(),
								&relation.foreign_key_column(),
							);
							ctx.order = Some(OrderClause::Subquery(sql, direction));
							return Ok(ctx);
						}
						// relation without resolvable metadata falls
						// through to the default order
					}
					None => {
						ctx.order =
							Some(OrderClause::Column(field.attribute().to_string(), direction));
						return Ok(ctx);
					}
				}
			}
		}
		let column = ctx
			.resource
			.created_at_column()
			.unwrap_or_else(|| ctx.resource.primary_key())
			.to_string();
		ctx.order = Some(OrderClause::Column(column, SortDirection::Desc));
		Ok(ctx)
	}
}

fn correlated_display_sql(
	related_table: &str,
	display: &str,
	owner_key: &str,
	parent_table: &str,
	foreign_key: &str,
) -> String {
	format!(
		r#"(SELECT "{related_table}"."{display}" FROM "{related_table}" WHERE "{related_table}"."{owner_key}" = "{parent_table}"."{foreign_key}" LIMIT 1)"#
	)
}

/// Narrows the column plan to the comma-separated `fields` request, with
/// the primary key (and the soft-delete column) always kept
pub struct ApplyFields;

#[async_trait]
impl Stage for ApplyFields {
	fn name(&self) -> &'static str {
		"apply_fields"
	}

	async fn process(&self, mut ctx: ListContext) -> AdminResult<ListContext> {
		let Some(requested) = ctx.request.requested_fields() else {
			return Ok(ctx);
		};
		let mut wanted: Vec<String> = Vec::new();
		for key in requested {
			if let Some(field) = ctx.fields.iter().find(|f| f.key() == key) {
				wanted.push(field.attribute().to_string());
			}
		}
		let pk = ctx.resource.primary_key().to_string();
		let deleted_at = ctx.resource.deleted_at_column().to_string();
		ctx.columns.retain(|column| {
			*column == pk
				|| (ctx.resource.soft_deletes() && *column == deleted_at)
				|| wanted.contains(column)
		});
		Ok(ctx)
	}
}

/// Clamp the page size to the resource's allowed set and the global cap
fn clamp_per_page(resource: &dyn Resource, requested: Option<u64>) -> u64 {
	let mut per_page = requested.unwrap_or_else(|| resource.per_page());
	if per_page != resource.per_page() && !resource.per_page_options().contains(&per_page) {
		per_page = resource.per_page();
	}
	per_page.clamp(1, limits::MAX_PAGE_SIZE)
}

fn value_key(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Counts, fetches, batch-loads belongs-to relations, and transforms rows
/// into record descriptors
pub struct PaginateAndTransform;

#[async_trait]
impl Stage for PaginateAndTransform {
	fn name(&self) -> &'static str {
		"paginate_transform"
	}

	async fn process(&self, mut ctx: ListContext) -> AdminResult<ListContext> {
		let resource = ctx.resource.clone();
		let per_page = clamp_per_page(resource.as_ref(), ctx.request.per_page);
		let page = Ord::max(ctx.request.page.unwrap_or(1), 1);

		let count = ctx.database.count(&ctx.query).await?;
		let total_pages = count.div_ceil(per_page);

		let mut data_query = ctx.query.clone();
		for column in &ctx.columns {
			data_query.column((Alias::new(resource.table()), Alias::new(column)));
		}
		match &ctx.order {
			Some(OrderClause::Column(column, direction)) => {
				data_query.order_by(Alias::new(column), to_order(*direction));
			}
			Some(OrderClause::Subquery(sql, direction)) => {
				data_query.order_by_expr(Expr::cust(sql.clone()), to_order(*direction));
			}
			None => {}
		}
		data_query.limit(per_page).offset((page - 1) * per_page);

		let mut rows = ctx.database.fetch_all(&data_query).await?;
		attach_eager_loads(&mut ctx, &mut rows).await?;

		let action_descriptors: Vec<_> =
			resource.actions().iter().map(|a| a.descriptor()).collect();
		let pk = resource.primary_key();
		let soft = resource.soft_deletes();

		let mut records = Vec::with_capacity(rows.len());
		for row in rows {
			let record_ctx = FieldContext::with_record(View::Index, row.clone());
			let attributes = ctx
				.fields
				.iter()
				.filter(|field| field.visible_in(View::Index, &record_ctx))
				.map(|field| field.to_descriptor(&record_ctx))
				.collect();
			let deleted_at = if soft {
				row.get(resource.deleted_at_column()).filter(|v| !v.is_null()).cloned()
			} else {
				None
			};
			let permissions =
				ctx.gate.permissions(resource.as_ref(), Some(&row), &ctx.actor).await;
			records.push(RecordDescriptor {
				id: row.get(pk).cloned().unwrap_or(Value::Null),
				attributes,
				deleted_at,
				permissions,
				actions: action_descriptors.clone(),
			});
		}

		ctx.response = Some(IndexResponse {
			resource: resource.uri_key(),
			count,
			page,
			per_page,
			total_pages,
			records,
		});
		Ok(ctx)
	}
}

fn to_order(direction: SortDirection) -> Order {
	match direction {
		SortDirection::Asc => Order::Asc,
		SortDirection::Desc => Order::Desc,
	}
}

/// Batch-fetch each eager-loadable belongs-to relation and attach the
/// related row under the relation name
async fn attach_eager_loads(ctx: &mut ListContext, rows: &mut [Record]) -> AdminResult<()> {
	for relation in &ctx.eager {
		let Some(related_table) = relation.related_table.clone().or_else(|| {
			let key = relation.related_resource.as_deref()?;
			Some(ctx.registry.get(key)?.table().to_string())
		}) else {
			continue;
		};
		let fk = relation.foreign_key_column();
		let mut keys: Vec<Value> = Vec::new();
		for row in rows.iter() {
			if let Some(value) = row.get(&fk).filter(|v| !v.is_null()) {
				if !keys.contains(value) {
					keys.push(value.clone());
				}
			}
		}
		if keys.is_empty() {
			continue;
		}

		let mut related_query = Query::select().from(Alias::new(&related_table)).to_owned();
		for column in relation.eager_columns() {
			related_query.column(Alias::new(column));
		}
		related_query.and_where(
			Expr::col(Alias::new(&relation.owner_key))
				.is_in(keys.iter().map(crate::database::json_to_sea_value)),
		);
		let related_rows = ctx.database.fetch_all(&related_query).await?;

		let by_key: std::collections::HashMap<String, Record> = related_rows
			.into_iter()
			.filter_map(|record| {
				let key = record.get(&relation.owner_key).map(value_key)?;
				Some((key, record))
			})
			.collect();
		for row in rows.iter_mut() {
			let attached = row
				.get(&fk)
				.filter(|v| !v.is_null())
				.and_then(|v| by_key.get(&value_key(v)))
				.map(|record| Value::Object(record.clone()))
				.unwrap_or(Value::Null);
			row.insert(relation.name.clone(), attached);
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::Field;
	use rstest::rstest;

	struct Posts;

	impl Resource for Posts {
		fn name(&self) -> &str {
			"PostResource"
		}

		fn table(&self) -> &str {
			"posts"
		}

		fn fields(&self, _ctx: &FieldContext) -> Vec<crate::fields::FieldElement> {
			vec![
				Field::text("Title", "title").sortable().into(),
				Field::number("Price", "price").filterable().into(),
			]
		}

		fn per_page(&self) -> u64 {
			25
		}

		fn per_page_options(&self) -> Vec<u64> {
			vec![10, 25, 50]
		}
	}

	#[test]
	fn split_range_keys_fold_into_start_end_objects() {
		let mut raw = serde_json::Map::new();
		raw.insert("price_from".into(), serde_json::json!(5));
		raw.insert("price_to".into(), serde_json::json!(10));
		raw.insert("stray_from".into(), serde_json::json!(1));

		let normalized = normalize_filters(&raw, &["price".to_string()]);
		assert_eq!(
			normalized.get("price"),
			Some(&serde_json::json!({"start": 5, "end": 10}))
		);
		assert!(normalized.get("stray_from").is_none());
		assert!(normalized.get("stray").is_none());
	}

	#[test]
	fn morph_pair_keys_fold_into_type_id_objects() {
		let mut raw = serde_json::Map::new();
		raw.insert("commentable_type".into(), serde_json::json!("post"));
		raw.insert("commentable_id".into(), serde_json::json!(3));

		let normalized = normalize_filters(&raw, &["commentable".to_string()]);
		assert_eq!(
			normalized.get("commentable"),
			Some(&serde_json::json!({"type": "post", "id": 3}))
		);
	}

	#[test]
	fn direct_filter_keys_pass_through_even_with_suffixes() {
		// author_id is itself a registered key here, so it must not fold
		let mut raw = serde_json::Map::new();
		raw.insert("author_id".into(), serde_json::json!(7));

		let normalized = normalize_filters(&raw, &["author_id".to_string()]);
		assert_eq!(normalized.get("author_id"), Some(&serde_json::json!(7)));
	}

	#[rstest]
	#[case(None, 25)]
	#[case(Some(10), 10)]
	#[case(Some(50), 50)]
	#[case(Some(33), 25)] // not in the allowed set
	#[case(Some(100_000), 25)]
	fn per_page_clamps_to_the_allowed_set(#[case] requested: Option<u64>, #[case] expected: u64) {
		assert_eq!(clamp_per_page(&Posts, requested), expected);
	}

	#[test]
	fn relation_search_renders_an_exists_subquery() {
		use sea_query::PostgresQueryBuilder;

		struct Books;

		impl Resource for Books {
			fn name(&self) -> &str {
				"BookResource"
			}

			fn table(&self) -> &str {
				"books"
			}

			fn fields(&self, _ctx: &FieldContext) -> Vec<crate::fields::FieldElement> {
				vec![Field::belongs_to("Author", "author").related_table("authors").into()]
			}
		}

		let registry = ResourceRegistry::new();
		let expr =
			search_relation_path(&registry, &Books, "books", "id", "author.name", "al").unwrap();
		let sql = Query::select()
			.from(Alias::new("books"))
			.and_where(expr)
			.to_owned()
			.to_string(PostgresQueryBuilder);

		assert!(sql.contains("EXISTS"));
		assert!(sql.contains(r#""authors"."id" = "books"."author_id""#));
		assert!(sql.contains(r#""authors"."name" LIKE '%al%'"#));
	}
}
