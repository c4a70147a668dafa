//! Many-to-many attachment management
//!
//! Attach, detach, and sync pivot rows for `belongs_to_many` (and
//! morph-to-many) fields, plus candidate listing for the attach picker.
//! Authorization (`update` on the parent record) is enforced at the
//! service boundary before these operations run.

use crate::database::{json_to_sea_value, Database};
use crate::fields::{Field, RelationConfig};
use crate::options::OptionsService;
use crate::registry::ResourceRegistry;
use grappelli_types::{AdminError, AdminResult, AttachRequest, OptionItem, OptionsQuery};
use sea_query::{Alias, Expr, ExprTrait, Query};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Pivot columns of a many-to-many relation
#[derive(Debug)]
struct PivotParts {
	table: String,
	foreign_key: String,
	related_key: String,
}

fn pivot_parts(relation: &RelationConfig) -> AdminResult<PivotParts> {
	if !relation.kind.uses_pivot() {
		return Err(AdminError::UnsupportedOperation(format!(
			"relation kind '{}' does not support attachment",
			relation.kind.name()
		)));
	}
	let missing = || {
		AdminError::UnsupportedOperation(format!(
			"relation '{}' is missing its pivot configuration",
			relation.name
		))
	};
	Ok(PivotParts {
		table: relation.pivot_table.clone().ok_or_else(missing)?,
		foreign_key: relation.pivot_foreign_key.clone().ok_or_else(missing)?,
		related_key: relation.pivot_related_key.clone().ok_or_else(missing)?,
	})
}

/// Manages pivot rows for many-to-many relation fields
#[derive(Clone)]
pub struct AttachmentService {
	database: Database,
	options: OptionsService,
}

impl AttachmentService {
	pub fn new(registry: Arc<ResourceRegistry>, database: Database) -> Self {
		let options = OptionsService::new(registry, database.clone());
		Self { database, options }
	}

	/// Related primary keys currently attached to the parent record
	pub async fn attached_ids(&self, field: &Field, parent_id: &Value) -> AdminResult<Vec<Value>> {
		let relation = require_relation(field)?;
		let pivot = pivot_parts(relation)?;
		let query = Query::select()
			.column(Alias::new(&pivot.related_key))
			.from(Alias::new(&pivot.table))
			.and_where(
				Expr::col(Alias::new(&pivot.foreign_key)).eq(json_to_sea_value(parent_id)),
			)
			.to_owned();
		let rows = self.database.fetch_all(&query).await?;
		Ok(rows
			.into_iter()
			.filter_map(|row| row.get(&pivot.related_key).cloned())
			.filter(|v| !v.is_null())
			.collect())
	}

	/// Candidate rows not yet attached, searched and limited like field
	/// options
	pub async fn attachable_items(
		&self,
		field: &Field,
		parent_id: &Value,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		let attached = self.attached_ids(field, parent_id).await?;
		let mut scoped = request.clone();
		for id in attached {
			if !scoped.exclude.contains(&id) {
				scoped.exclude.push(id);
			}
		}
		self.options.field_options(field, &scoped).await
	}

	/// Attach the requested related rows, skipping ones already attached.
	/// Returns the number of pivot rows written.
	pub async fn attach(
		&self,
		field: &Field,
		parent_id: &Value,
		request: &AttachRequest,
	) -> AdminResult<u64> {
		let relation = require_relation(field)?;
		let pivot = pivot_parts(relation)?;
		let attached = self.attached_ids(field, parent_id).await?;

		let mut written = 0;
		for id in &request.ids {
			if attached.contains(id) {
				continue;
			}
			let mut row: HashMap<String, Value> = HashMap::new();
			row.insert(pivot.foreign_key.clone(), parent_id.clone());
			row.insert(pivot.related_key.clone(), id.clone());
			for (column, value) in &request.pivot {
				// unknown pivot columns are dropped when the relation
				// declares its column set
				if relation.pivot_columns.is_empty()
					|| relation.pivot_columns.contains(column)
				{
					row.insert(column.clone(), value.clone());
				}
			}
			written += self.database.create(&pivot.table, row).await?;
		}
		Ok(written)
	}

	/// Detach the requested related rows. Returns the number of pivot rows
	/// removed; an empty id list is a no-op.
	pub async fn detach(
		&self,
		field: &Field,
		parent_id: &Value,
		ids: &[Value],
	) -> AdminResult<u64> {
		if ids.is_empty() {
			return Ok(0);
		}
		let relation = require_relation(field)?;
		let pivot = pivot_parts(relation)?;
		let statement = Query::delete()
			.from_table(Alias::new(&pivot.table))
			.and_where(
				Expr::col(Alias::new(&pivot.foreign_key)).eq(json_to_sea_value(parent_id)),
			)
			.and_where(
				Expr::col(Alias::new(&pivot.related_key)).is_in(ids.iter().map(json_to_sea_value)),
			)
			.to_owned();
		self.database.delete_where(&statement).await
	}

	/// Make the attached set exactly `ids`: detach the rest, attach the
	/// missing. Returns `(attached, detached)` row counts.
	pub async fn sync(
		&self,
		field: &Field,
		parent_id: &Value,
		ids: &[Value],
		pivot_values: &HashMap<String, Value>,
	) -> AdminResult<(u64, u64)> {
		let current = self.attached_ids(field, parent_id).await?;

		let to_detach: Vec<Value> =
			current.iter().filter(|id| !ids.contains(id)).cloned().collect();
		let to_attach: Vec<Value> =
			ids.iter().filter(|id| !current.contains(id)).cloned().collect();

		let detached = self.detach(field, parent_id, &to_detach).await?;
		let attached = self
			.attach(
				field,
				parent_id,
				&AttachRequest { ids: to_attach, pivot: pivot_values.clone() },
			)
			.await?;
		Ok((attached, detached))
	}
}

fn require_relation(field: &Field) -> AdminResult<&RelationConfig> {
	field.relation().ok_or_else(|| {
		AdminError::UnsupportedOperation(format!(
			"field '{}' is not a relation field",
			field.key()
		))
	})
}
