//! The resource service
//!
//! [`ResourceService`] bundles the registry, database, gate, and audit
//! logger behind one async surface mirroring the admin HTTP contract.
//! Authorization and existence checks run before any query building; a
//! denied gate or a missing record short-circuits the request.

use crate::validation;
use grappelli_core::actions;
use grappelli_core::attachment::AttachmentService;
use grappelli_core::config::AdminConfig;
use grappelli_core::database::{json_to_sea_value, Database};
use grappelli_core::events::{ActionEvent, ActionEventLogger};
use grappelli_core::fields::{Field, FieldContext, RelationKind, View};
use grappelli_core::options::OptionsService;
use grappelli_core::pipeline::{self, default_stages, ListContext};
use grappelli_core::resource::{Resource, ResourceExt};
use grappelli_core::{Ability, Actor, Gate, ResourceRegistry};
use grappelli_types::{
	field_to_label, ActionOutcome, ActionRequest, AdminError, AdminResult, AttachRequest,
	BulkDeleteRequest, ColumnInfo, DetachRequest, DetailResponse, FieldDescriptor,
	FieldsResponse, FiltersResponse, IndexQuery, IndexResponse, MutationRequest,
	MutationResponse, OptionItem, OptionsQuery, Record, RecordDescriptor, ResourceInfo,
	TrashedMode,
};
use sea_query::{Alias, Expr, ExprTrait, Query, SelectStatement};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

fn ability_name(ability: Ability) -> &'static str {
	match ability {
		Ability::ViewAny => "view any",
		Ability::View => "view",
		Ability::Create => "create",
		Ability::Update => "update",
		Ability::Delete => "delete",
		Ability::ForceDelete => "force delete",
		Ability::Restore => "restore",
		Ability::Attach => "attach",
		Ability::Detach => "detach",
		Ability::RunAction => "run actions on",
	}
}

fn snapshot(data: &HashMap<String, Value>) -> Value {
	Value::Object(data.clone().into_iter().collect())
}

/// Parse a path segment into the primary-key value it addresses.
///
/// Numeric segments compare as integers so integer-keyed tables match.
pub fn parse_id(raw: &str) -> Value {
	raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// The HTTP-facing admin surface as plain async methods
#[derive(Clone)]
pub struct ResourceService {
	registry: Arc<ResourceRegistry>,
	database: Database,
	gate: Arc<dyn Gate>,
	config: AdminConfig,
	events: ActionEventLogger,
	options: OptionsService,
	attachments: AttachmentService,
}

impl ResourceService {
	pub fn new(
		registry: Arc<ResourceRegistry>,
		database: Database,
		gate: Arc<dyn Gate>,
		config: AdminConfig,
	) -> Self {
		let events = ActionEventLogger::new(database.clone(), config.action_events.clone());
		let options = OptionsService::new(registry.clone(), database.clone());
		let attachments = AttachmentService::new(registry.clone(), database.clone());
		Self { registry, database, gate, config, events, options, attachments }
	}

	/// The shared registry, for wiring additional collaborators
	pub fn registry(&self) -> &Arc<ResourceRegistry> {
		&self.registry
	}

	fn resolve(&self, resource_key: &str) -> AdminResult<Arc<dyn Resource>> {
		self.registry.resolve(resource_key)
	}

	async fn authorize(
		&self,
		ability: Ability,
		resource: &dyn Resource,
		record: Option<&Record>,
		actor: &Actor,
	) -> AdminResult<()> {
		if self.gate.allows(ability, resource, record, actor).await {
			Ok(())
		} else {
			Err(AdminError::PermissionDenied(format!(
				"not allowed to {} '{}'",
				ability_name(ability),
				resource.uri_key()
			)))
		}
	}

	async fn fetch_record(&self, resource: &dyn Resource, id: &Value) -> AdminResult<Record> {
		self.database
			.get(resource.table(), resource.primary_key(), id)
			.await?
			.ok_or_else(|| AdminError::RecordNotFound {
				resource: resource.uri_key(),
				id: id.to_string(),
			})
	}

	fn field(&self, resource: &dyn Resource, field_key: &str) -> AdminResult<Field> {
		resource
			.field_by_key(&FieldContext::empty(), field_key)?
			.ok_or_else(|| AdminError::FieldNotFound {
				resource: resource.uri_key(),
				field: field_key.to_string(),
			})
	}

	fn descriptors_for(
		&self,
		fields: &[Field],
		view: View,
		ctx: &FieldContext,
	) -> Vec<FieldDescriptor> {
		fields
			.iter()
			.filter(|field| field.visible_in(view, ctx))
			.map(|field| {
				let mut descriptor = field.to_descriptor(ctx);
				descriptor.component =
					self.config.component_for(&descriptor.field_type, &descriptor.component);
				descriptor
			})
			.collect()
	}

	// ---- metadata ----

	/// Static metadata about one resource
	pub fn info(&self, resource_key: &str) -> AdminResult<ResourceInfo> {
		let resource = self.resolve(resource_key)?;
		let ctx = FieldContext::for_view(View::Index);
		let columns = resource
			.flat_fields(&ctx)?
			.iter()
			.filter(|field| field.visible_in(View::Index, &ctx))
			.map(|field| ColumnInfo {
				field: field.attribute().to_string(),
				label: if field.label().is_empty() {
					field_to_label(field.attribute())
				} else {
					field.label().to_string()
				},
				sortable: field.is_sortable(),
			})
			.collect();

		Ok(ResourceInfo {
			key: resource.uri_key(),
			name: resource.name().to_string(),
			title: resource.title_attribute().to_string(),
			soft_deletes: resource.soft_deletes(),
			per_page: resource.per_page(),
			per_page_options: resource.per_page_options(),
			searchable: resource.searchable_columns(),
			columns,
		})
	}

	/// Field metadata for one view, without record values
	pub fn fields(&self, resource_key: &str, view: View) -> AdminResult<FieldsResponse> {
		let resource = self.resolve(resource_key)?;
		let ctx = FieldContext::for_view(view);
		let fields = resource.flat_fields(&ctx)?;
		Ok(FieldsResponse {
			resource: resource.uri_key(),
			fields: self.descriptors_for(&fields, view, &ctx),
		})
	}

	/// Transport descriptors of every filter the index accepts
	pub fn filters(&self, resource_key: &str) -> AdminResult<FiltersResponse> {
		let resource = self.resolve(resource_key)?;
		let filters = resource.all_filters(&FieldContext::for_view(View::Index))?;
		Ok(FiltersResponse {
			resource: resource.uri_key(),
			filters: filters.iter().flat_map(|filter| filter.descriptors()).collect(),
		})
	}

	/// Descriptors of the actions runnable against this resource
	pub fn actions(&self, resource_key: &str) -> AdminResult<Vec<grappelli_types::ActionDescriptor>> {
		let resource = self.resolve(resource_key)?;
		Ok(resource.actions().iter().map(|action| action.descriptor()).collect())
	}

	// ---- listing ----

	/// Run the index pipeline for one listing request
	pub async fn index(
		&self,
		resource_key: &str,
		actor: &Actor,
		request: IndexQuery,
	) -> AdminResult<IndexResponse> {
		let resource = self.resolve(resource_key)?;
		self.authorize(Ability::ViewAny, resource.as_ref(), None, actor).await?;

		let ctx = ListContext::new(
			resource,
			self.registry.clone(),
			self.database.clone(),
			self.gate.clone(),
			actor.clone(),
			request,
		);
		pipeline::run(&default_stages(), ctx).await
	}

	/// Fetch and transform a single record for the detail view
	pub async fn detail(
		&self,
		resource_key: &str,
		actor: &Actor,
		id: &Value,
	) -> AdminResult<DetailResponse> {
		let resource = self.resolve(resource_key)?;
		let mut record = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::View, resource.as_ref(), Some(&record), actor).await?;

		self.attach_detail_relations(resource.as_ref(), &mut record).await?;

		let ctx = FieldContext::with_record(View::Detail, record.clone());
		let fields = resource.flat_fields(&ctx)?;
		let deleted_at = resource
			.soft_deletes()
			.then(|| record.get(resource.deleted_at_column()).cloned())
			.flatten()
			.filter(|v| !v.is_null());

		Ok(DetailResponse {
			resource: resource.uri_key(),
			record: RecordDescriptor {
				id: record.get(resource.primary_key()).cloned().unwrap_or(Value::Null),
				attributes: self.descriptors_for(&fields, View::Detail, &ctx),
				deleted_at,
				permissions: self.gate.permissions(resource.as_ref(), Some(&record), actor).await,
				actions: resource.actions().iter().map(|a| a.descriptor()).collect(),
			},
		})
	}

	/// Resolve the single related row of each eager-loadable belongs-to
	/// relation and nest it under the relation name
	async fn attach_detail_relations(
		&self,
		resource: &dyn Resource,
		record: &mut Record,
	) -> AdminResult<()> {
		let ctx = FieldContext::for_view(View::Detail);
		let declared = resource.with_detail();
		for field in resource.flat_fields(&ctx)? {
			let Some(relation) = field.relation() else { continue };
			if !relation.eager_loadable() && !declared.contains(&relation.name) {
				continue;
			}
			if relation.kind != RelationKind::BelongsTo {
				continue;
			}
			let Some(related_table) = relation.related_table.clone().or_else(|| {
				relation
					.related_resource
					.as_deref()
					.and_then(|key| self.registry.get(key))
					.map(|related| related.table().to_string())
			}) else {
				continue;
			};
			let fk_value = match record.get(&relation.foreign_key_column()) {
				Some(value) if !value.is_null() => value.clone(),
				_ => {
					record.insert(relation.name.clone(), Value::Null);
					continue;
				}
			};
			let statement: SelectStatement = Query::select()
				.from(Alias::new(&related_table))
				.columns(relation.eager_columns().into_iter().map(Alias::new))
				.and_where(
					Expr::col(Alias::new(&relation.owner_key)).eq(json_to_sea_value(&fk_value)),
				)
				.to_owned();
			let related = self.database.fetch_optional(&statement).await?;
			record.insert(
				relation.name.clone(),
				related.map(Value::Object).unwrap_or(Value::Null),
			);
		}
		Ok(())
	}

	// ---- mutations ----

	/// Validate and persist a new record
	pub async fn create(
		&self,
		resource_key: &str,
		actor: &Actor,
		request: MutationRequest,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		self.authorize(Ability::Create, resource.as_ref(), None, actor).await?;

		let fields = resource.flat_fields(&FieldContext::for_view(View::Creation))?;
		let fillable = validation::validate_mutation(
			&fields,
			View::Creation,
			resource.primary_key(),
			&request.data,
		)?;

		let affected = self.database.create(resource.table(), fillable.clone()).await?;
		tracing::debug!(resource = %resource.uri_key(), affected, "create");
		self.events
			.record(ActionEvent::for_create(
				&resource.uri_key(),
				actor,
				&Value::Null,
				snapshot(&fillable),
			))
			.await;

		Ok(MutationResponse {
			success: true,
			message: format!("{} created", resource.name()),
			affected: Some(affected),
			data: Some(fillable),
		})
	}

	/// Validate and persist changes to an existing record
	pub async fn update(
		&self,
		resource_key: &str,
		actor: &Actor,
		id: &Value,
		request: MutationRequest,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		let original = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::Update, resource.as_ref(), Some(&original), actor).await?;

		let fields = resource
			.flat_fields(&FieldContext::with_record(View::Update, original.clone()))?;
		let fillable = validation::validate_mutation(
			&fields,
			View::Update,
			resource.primary_key(),
			&request.data,
		)?;

		let affected = self
			.database
			.update(resource.table(), resource.primary_key(), id, fillable.clone())
			.await?;
		tracing::debug!(resource = %resource.uri_key(), %id, affected, "update");
		self.events
			.record(ActionEvent::for_update(
				&resource.uri_key(),
				actor,
				id,
				Value::Object(original),
				snapshot(&fillable),
			))
			.await;

		Ok(MutationResponse {
			success: true,
			message: format!("{} updated", resource.name()),
			affected: Some(affected),
			data: Some(fillable),
		})
	}

	/// Delete one record, soft when the resource soft-deletes
	pub async fn delete(
		&self,
		resource_key: &str,
		actor: &Actor,
		id: &Value,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		let original = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::Delete, resource.as_ref(), Some(&original), actor).await?;

		let affected = if resource.soft_deletes() {
			let stamp = Value::String(chrono::Utc::now().to_rfc3339());
			let data = HashMap::from([(resource.deleted_at_column().to_string(), stamp)]);
			self.database.update(resource.table(), resource.primary_key(), id, data).await?
		} else {
			self.database.delete(resource.table(), resource.primary_key(), id).await?
		};
		tracing::debug!(
			resource = %resource.uri_key(),
			%id,
			soft = resource.soft_deletes(),
			"delete"
		);
		self.events
			.record(ActionEvent::for_delete(
				&resource.uri_key(),
				actor,
				id,
				Value::Object(original),
			))
			.await;

		Ok(MutationResponse {
			success: true,
			message: format!("{} deleted", resource.name()),
			affected: Some(affected),
			data: None,
		})
	}

	/// Remove a soft-deleting record's row for good
	pub async fn force_delete(
		&self,
		resource_key: &str,
		actor: &Actor,
		id: &Value,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		if !resource.soft_deletes() {
			return Err(AdminError::UnsupportedOperation(format!(
				"resource '{}' does not soft-delete",
				resource.uri_key()
			)));
		}
		let original = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::ForceDelete, resource.as_ref(), Some(&original), actor).await?;

		let affected =
			self.database.delete(resource.table(), resource.primary_key(), id).await?;
		self.events
			.record(ActionEvent::for_delete(
				&resource.uri_key(),
				actor,
				id,
				Value::Object(original),
			))
			.await;

		Ok(MutationResponse {
			success: true,
			message: format!("{} permanently deleted", resource.name()),
			affected: Some(affected),
			data: None,
		})
	}

	/// Clear a record's soft-delete timestamp
	pub async fn restore(
		&self,
		resource_key: &str,
		actor: &Actor,
		id: &Value,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		if !resource.soft_deletes() {
			return Err(AdminError::UnsupportedOperation(format!(
				"resource '{}' does not soft-delete",
				resource.uri_key()
			)));
		}
		let record = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::Restore, resource.as_ref(), Some(&record), actor).await?;

		let data = HashMap::from([(resource.deleted_at_column().to_string(), Value::Null)]);
		let affected =
			self.database.update(resource.table(), resource.primary_key(), id, data).await?;
		self.events
			.record(ActionEvent::for_restore(&resource.uri_key(), actor, id))
			.await;

		Ok(MutationResponse {
			success: true,
			message: format!("{} restored", resource.name()),
			affected: Some(affected),
			data: None,
		})
	}

	/// Delete many records in one request
	pub async fn bulk_delete(
		&self,
		resource_key: &str,
		actor: &Actor,
		request: BulkDeleteRequest,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		self.authorize(Ability::Delete, resource.as_ref(), None, actor).await?;

		let ids: Vec<Value> = request.ids.iter().map(|raw| parse_id(raw)).collect();
		let affected = if resource.soft_deletes() {
			let mut affected = 0;
			let stamp = Value::String(chrono::Utc::now().to_rfc3339());
			for id in &ids {
				let data =
					HashMap::from([(resource.deleted_at_column().to_string(), stamp.clone())]);
				affected += self
					.database
					.update(resource.table(), resource.primary_key(), id, data)
					.await?;
			}
			affected
		} else {
			self.database.bulk_delete(resource.table(), resource.primary_key(), &ids).await?
		};
		for id in &ids {
			self.events
				.record(ActionEvent::for_delete(&resource.uri_key(), actor, id, Value::Null))
				.await;
		}

		Ok(MutationResponse {
			success: true,
			message: format!("{} records deleted", affected),
			affected: Some(affected),
			data: None,
		})
	}

	// ---- options ----

	/// Options for one relation field's select
	pub async fn field_options(
		&self,
		resource_key: &str,
		field_key: &str,
		actor: &Actor,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		let resource = self.resolve(resource_key)?;
		self.authorize(Ability::ViewAny, resource.as_ref(), None, actor).await?;
		let field = self.field(resource.as_ref(), field_key)?;
		self.options.field_options(&field, request).await
	}

	/// Page-at-a-time options for fields flagged `paginated`
	pub async fn paginated_field_options(
		&self,
		resource_key: &str,
		field_key: &str,
		actor: &Actor,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		let resource = self.resolve(resource_key)?;
		self.authorize(Ability::ViewAny, resource.as_ref(), None, actor).await?;
		let field = self.field(resource.as_ref(), field_key)?;
		self.options.paginated_field_options(&field, request).await
	}

	/// Options for one target type of a morph-to field
	pub async fn morph_options(
		&self,
		resource_key: &str,
		field_key: &str,
		morph_type: &str,
		actor: &Actor,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		let resource = self.resolve(resource_key)?;
		self.authorize(Ability::ViewAny, resource.as_ref(), None, actor).await?;
		let field = self.field(resource.as_ref(), field_key)?;
		self.options.morph_options(&field, morph_type, request).await
	}

	// ---- attachments ----

	/// Related records not yet attached to the parent
	pub async fn attachable_items(
		&self,
		resource_key: &str,
		id: &Value,
		field_key: &str,
		actor: &Actor,
		request: &OptionsQuery,
	) -> AdminResult<Vec<OptionItem>> {
		let resource = self.resolve(resource_key)?;
		let parent = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::Attach, resource.as_ref(), Some(&parent), actor).await?;
		let field = self.field(resource.as_ref(), field_key)?;
		self.attachments.attachable_items(&field, id, request).await
	}

	/// Attach related records through the pivot table
	pub async fn attach(
		&self,
		resource_key: &str,
		id: &Value,
		field_key: &str,
		actor: &Actor,
		request: &AttachRequest,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		let parent = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::Attach, resource.as_ref(), Some(&parent), actor).await?;
		let field = self.field(resource.as_ref(), field_key)?;

		let affected = self.attachments.attach(&field, id, request).await?;
		self.events
			.record(ActionEvent::for_action("Attach", &resource.uri_key(), actor, id))
			.await;

		Ok(MutationResponse {
			success: true,
			message: format!("{} records attached", affected),
			affected: Some(affected),
			data: None,
		})
	}

	/// Detach related records from the pivot table
	pub async fn detach(
		&self,
		resource_key: &str,
		id: &Value,
		field_key: &str,
		actor: &Actor,
		request: &DetachRequest,
	) -> AdminResult<MutationResponse> {
		let resource = self.resolve(resource_key)?;
		let parent = self.fetch_record(resource.as_ref(), id).await?;
		self.authorize(Ability::Detach, resource.as_ref(), Some(&parent), actor).await?;
		let field = self.field(resource.as_ref(), field_key)?;

		let affected = self.attachments.detach(&field, id, &request.ids).await?;
		self.events
			.record(ActionEvent::for_action("Detach", &resource.uri_key(), actor, id))
			.await;

		Ok(MutationResponse {
			success: true,
			message: format!("{} records detached", affected),
			affected: Some(affected),
			data: None,
		})
	}

	// ---- actions ----

	/// Run a named action against the requested records.
	///
	/// Action failures never bubble out as errors; they come back as a
	/// `Danger` outcome and land in the audit log with `failed` status.
	pub async fn run_action(
		&self,
		resource_key: &str,
		action_key: &str,
		actor: &Actor,
		request: &ActionRequest,
	) -> AdminResult<ActionOutcome> {
		let resource = self.resolve(resource_key)?;
		self.authorize(Ability::RunAction, resource.as_ref(), None, actor).await?;

		let action = resource
			.actions()
			.into_iter()
			.find(|action| action.uri_key() == action_key)
			.ok_or_else(|| {
				AdminError::UnsupportedOperation(format!(
					"resource '{}' has no action '{}'",
					resource.uri_key(),
					action_key
				))
			})?;

		let mut records = Vec::new();
		if !action.standalone() {
			for id in &request.ids {
				records.push(self.fetch_record(resource.as_ref(), id).await?);
			}
		}

		let outcome = actions::dispatch(action.as_ref(), &records).await;

		if action.standalone() {
			self.events
				.record(ActionEvent::for_action(
					action.name(),
					&resource.uri_key(),
					actor,
					&Value::Null,
				))
				.await;
		} else {
			for id in &request.ids {
				self.events
					.record(ActionEvent::for_action(
						action.name(),
						&resource.uri_key(),
						actor,
						id,
					))
					.await;
			}
		}

		Ok(outcome)
	}

	// ---- trash helpers ----

	/// Whether the given trashed mode may address the record at all
	pub fn trashed_mode_allows(mode: TrashedMode, deleted: bool) -> bool {
		match mode {
			TrashedMode::Without => !deleted,
			TrashedMode::Only => deleted,
			TrashedMode::With => true,
		}
	}
}
