//! The index request pipeline
//!
//! An index request flows through a fixed stage order:
//!
//! BuildQuery -> ApplySearch -> ApplyFilters -> ApplySorting ->
//! ApplyFields -> PaginateAndTransform
//!
//! Each stage is a no-op when it has nothing to do; bad input degrades to
//! "no constraint applied" rather than erroring. Authorization has already
//! happened at the service boundary before the first stage runs.
//!
//! The shared `SelectStatement` carries FROM and WHERE only. The column
//! plan and the order clause are tracked separately on the context and
//! applied to a clone at paginate time, so the COUNT query never carries
//! an ORDER BY or a column list.

mod stages;

pub use stages::{
	normalize_filters, ApplyFields, ApplyFilters, ApplySearch, ApplySorting, BuildQuery,
	PaginateAndTransform,
};

use crate::auth::{Actor, Gate};
use crate::database::Database;
use crate::fields::{Field, RelationConfig};
use crate::registry::ResourceRegistry;
use crate::resource::Resource;
use async_trait::async_trait;
use grappelli_types::{AdminResult, IndexQuery, IndexResponse, SortDirection};
use sea_query::SelectStatement;
use std::sync::Arc;

/// Deferred ORDER BY, applied only to the data query
#[derive(Debug, Clone)]
pub enum OrderClause {
	/// Plain column on the resource table
	Column(String, SortDirection),
	/// Raw correlated scalar subquery, for relation-backed sort fields
	Subquery(String, SortDirection),
}

/// State threaded through the pipeline stages
pub struct ListContext {
	pub resource: Arc<dyn Resource>,
	pub registry: Arc<ResourceRegistry>,
	pub database: Database,
	pub gate: Arc<dyn Gate>,
	pub actor: Actor,
	pub request: IndexQuery,
	/// FROM + WHERE only; never ORDER BY or columns
	pub query: SelectStatement,
	/// Columns the data query will select
	pub columns: Vec<String>,
	/// Deferred order clause
	pub order: Option<OrderClause>,
	/// Flattened index-context fields
	pub fields: Vec<Field>,
	/// Belongs-to relations batch-fetched during transformation
	pub eager: Vec<RelationConfig>,
	/// Populated by the final stage
	pub response: Option<IndexResponse>,
}

impl ListContext {
	pub fn new(
		resource: Arc<dyn Resource>,
		registry: Arc<ResourceRegistry>,
		database: Database,
		gate: Arc<dyn Gate>,
		actor: Actor,
		request: IndexQuery,
	) -> Self {
		Self {
			resource,
			registry,
			database,
			gate,
			actor,
			request,
			query: SelectStatement::new(),
			columns: Vec::new(),
			order: None,
			fields: Vec::new(),
			eager: Vec::new(),
			response: None,
		}
	}
}

/// One pipeline stage
#[async_trait]
pub trait Stage: Send + Sync {
	fn name(&self) -> &'static str;

	async fn process(&self, ctx: ListContext) -> AdminResult<ListContext>;
}

/// The canonical stage order
pub fn default_stages() -> Vec<Box<dyn Stage>> {
	vec![
		Box::new(BuildQuery),
		Box::new(ApplySearch),
		Box::new(ApplyFilters),
		Box::new(ApplySorting),
		Box::new(ApplyFields),
		Box::new(PaginateAndTransform),
	]
}

/// Fold the context through the stages in order
pub async fn run(stages: &[Box<dyn Stage>], mut ctx: ListContext) -> AdminResult<IndexResponse> {
	for stage in stages {
		tracing::trace!(stage = stage.name(), resource = %ctx.resource.uri_key(), "pipeline stage");
		ctx = stage.process(ctx).await?;
	}
	ctx.response.ok_or_else(|| {
		grappelli_types::AdminError::Database("pipeline finished without a response".into())
	})
}
