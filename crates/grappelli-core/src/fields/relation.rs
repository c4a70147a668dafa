//! Relation metadata carried by relation-typed fields
//!
//! All relation knowledge is explicit configuration: foreign keys, pivot
//! tables, morph attribute pairs. Strategies read it through accessors
//! instead of reflecting into field internals.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The supported relation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
	BelongsTo,
	HasMany,
	BelongsToMany,
	MorphTo,
	MorphToMany,
	MorphedByMany,
}

impl RelationKind {
	/// Lowercase name used in error messages and descriptors
	pub fn name(&self) -> &'static str {
		match self {
			RelationKind::BelongsTo => "belongs_to",
			RelationKind::HasMany => "has_many",
			RelationKind::BelongsToMany => "belongs_to_many",
			RelationKind::MorphTo => "morph_to",
			RelationKind::MorphToMany => "morph_to_many",
			RelationKind::MorphedByMany => "morphed_by_many",
		}
	}

	/// Whether rows of this kind are linked through a pivot table
	pub fn uses_pivot(&self) -> bool {
		matches!(
			self,
			RelationKind::BelongsToMany | RelationKind::MorphToMany | RelationKind::MorphedByMany
		)
	}
}

/// One selectable target of a polymorphic relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphTarget {
	/// Storage table of the target model
	pub table: String,
	/// URI key of the target's registered resource, when it has one
	pub resource_key: Option<String>,
	/// Display label for the type selector
	pub label: String,
}

/// Relation configuration of one field
#[derive(Debug, Clone)]
pub struct RelationConfig {
	/// Relation kind
	pub kind: RelationKind,
	/// Relation name (also the default API key of the field)
	pub name: String,
	/// Related storage table (unset for morph-to, resolved per type)
	pub related_table: Option<String>,
	/// URI key of the related registered resource
	pub related_resource: Option<String>,
	/// Foreign key column (on the parent for belongs-to, on the related
	/// table for has-many)
	pub foreign_key: Option<String>,
	/// Primary key of the related table
	pub owner_key: String,
	/// Local key on the parent table
	pub local_key: String,
	/// Pivot table for many-to-many kinds
	pub pivot_table: Option<String>,
	/// Pivot column referencing the parent
	pub pivot_foreign_key: Option<String>,
	/// Pivot column referencing the related model
	pub pivot_related_key: Option<String>,
	/// Extra pivot columns exposed alongside attached rows
	pub pivot_columns: Vec<String>,
	/// Morph discriminator attribute (`{name}_type`)
	pub morph_type_attribute: Option<String>,
	/// Morph id attribute (`{name}_id`)
	pub morph_id_attribute: Option<String>,
	/// Alias -> target map for morph-to fields
	pub morph_targets: BTreeMap<String, MorphTarget>,
	/// Column used as the display label for options and eager loads
	pub display_attribute: Option<String>,
	/// Columns eager-loaded for the index view (empty = display + pk)
	pub related_columns: Vec<String>,
	/// Paginated relations are fetched through their own endpoint and
	/// excluded from index eager loading
	pub paginated: bool,
}

impl RelationConfig {
	/// Base configuration for a relation of `kind` named `name`
	pub fn new(kind: RelationKind, name: impl Into<String>) -> Self {
		let name = name.into();
		let (morph_type, morph_id) = if matches!(kind, RelationKind::MorphTo) {
			(Some(format!("{name}_type")), Some(format!("{name}_id")))
		} else {
			(None, None)
		};
		Self {
			kind,
			name,
			related_table: None,
			related_resource: None,
			foreign_key: None,
			owner_key: "id".into(),
			local_key: "id".into(),
			pivot_table: None,
			pivot_foreign_key: None,
			pivot_related_key: None,
			pivot_columns: Vec::new(),
			morph_type_attribute: morph_type,
			morph_id_attribute: morph_id,
			morph_targets: BTreeMap::new(),
			display_attribute: None,
			related_columns: Vec::new(),
			paginated: false,
		}
	}

	/// Effective foreign key column.
	///
	/// Defaults to `{name}_id` when not configured explicitly, mirroring
	/// the conventional belongs-to introspection.
	pub fn foreign_key_column(&self) -> String {
		self.foreign_key.clone().unwrap_or_else(|| format!("{}_id", self.name))
	}

	/// Columns to select when eager-loading related rows
	pub fn eager_columns(&self) -> Vec<String> {
		if !self.related_columns.is_empty() {
			let mut columns = self.related_columns.clone();
			if !columns.iter().any(|c| c == &self.owner_key) {
				columns.insert(0, self.owner_key.clone());
			}
			return columns;
		}
		let mut columns = vec![self.owner_key.clone()];
		if let Some(display) = &self.display_attribute {
			columns.push(display.clone());
		}
		columns
	}

	/// Whether this relation may participate in index eager loading
	pub fn eager_loadable(&self) -> bool {
		!self.paginated && matches!(self.kind, RelationKind::BelongsTo)
	}
}
