//! End-to-end tests of the resource service against in-memory SQLite

#![cfg(feature = "sqlite")]

use async_trait::async_trait;
use grappelli_api::{parse_id, ResourceService};
use grappelli_core::actions::Action;
use grappelli_core::config::AdminConfig;
use grappelli_core::events;
use grappelli_core::fields::{Field, FieldContext, FieldElement, Rule, View};
use grappelli_core::resource::Resource;
use grappelli_core::{Actor, AllowAll, Database, DenyAll, ResourceRegistry, SqliteConnection};
use grappelli_types::{
	ActionOutcome, ActionRequest, AdminError, AdminResult, AttachRequest, DetachRequest,
	IndexQuery, MutationRequest, OptionsQuery, Record, SortDirection,
};
use serde_json::{json, Value};
use std::sync::Arc;

// ---- fixture resources ----

struct TaskResource;

impl Resource for TaskResource {
	fn name(&self) -> &str {
		"TaskResource"
	}

	fn table(&self) -> &str {
		"tasks"
	}

	fn title_attribute(&self) -> &str {
		"title"
	}

	fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
		vec![
			Field::text("Title", "title")
				.filterable()
				.with_rules(vec![Rule::Required])
				.into(),
			Field::toggle("Done", "done").sortable().filterable().into(),
			Field::datetime("Due", "due_at").sortable().filterable().into(),
		]
	}

	fn searchable_columns(&self) -> Vec<String> {
		vec!["title".into()]
	}

	fn per_page_options(&self) -> Vec<u64> {
		vec![10, 25, 50]
	}

	fn actions(&self) -> Vec<Box<dyn Action>> {
		vec![Box::new(PublishAction), Box::new(BrokenAction)]
	}
}

struct NoteResource;

impl Resource for NoteResource {
	fn name(&self) -> &str {
		"NoteResource"
	}

	fn table(&self) -> &str {
		"notes"
	}

	fn title_attribute(&self) -> &str {
		"body"
	}

	fn soft_deletes(&self) -> bool {
		true
	}

	fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
		vec![Field::text("Body", "body").with_rules(vec![Rule::Required]).into()]
	}
}

struct UserResource;

impl Resource for UserResource {
	fn name(&self) -> &str {
		"UserResource"
	}

	fn table(&self) -> &str {
		"users"
	}

	fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
		vec![Field::text("Name", "name").into()]
	}

	fn searchable_columns(&self) -> Vec<String> {
		vec!["name".into()]
	}
}

struct PostResource;

impl Resource for PostResource {
	fn name(&self) -> &str {
		"PostResource"
	}

	fn table(&self) -> &str {
		"posts"
	}

	fn title_attribute(&self) -> &str {
		"title"
	}

	fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
		vec![
			Field::text("Title", "title").into(),
			Field::belongs_to("Author", "author").related_resource("users").into(),
			Field::belongs_to_many("Tags", "tags")
				.related_resource("tags")
				.pivot("post_tag", "post_id", "tag_id")
				.into(),
		]
	}
}

struct TagResource;

impl Resource for TagResource {
	fn name(&self) -> &str {
		"TagResource"
	}

	fn table(&self) -> &str {
		"tags"
	}

	// the tags table carries no creation timestamp
	fn created_at_column(&self) -> Option<&str> {
		None
	}

	fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
		vec![Field::text("Name", "name").into()]
	}
}

struct CommentResource;

impl Resource for CommentResource {
	fn name(&self) -> &str {
		"CommentResource"
	}

	fn table(&self) -> &str {
		"comments"
	}

	fn title_attribute(&self) -> &str {
		"body"
	}

	fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
		vec![
			Field::text("Body", "body").into(),
			Field::morph_to("Commentable", "commentable")
				.filterable()
				.morph_target("post", "posts", Some("posts".into()), "Post")
				.morph_target("video", "videos", None, "Video")
				.into(),
		]
	}
}

struct WizardResource;

impl Resource for WizardResource {
	fn name(&self) -> &str {
		"WizardResource"
	}

	fn table(&self) -> &str {
		"wizards"
	}

	fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
		vec![
			Field::select("Type", "type").into(),
			Field::toggle("Locked", "is_locked").into(),
			Field::number("Parent", "parent_id").into(),
			Field::text("Secret", "secret")
				.show_when_equals("type", "special")
				.disable_when_truthy("is_locked")
				.required_when_has_value("parent_id")
				.into(),
		]
	}
}

struct PublishAction;

#[async_trait]
impl Action for PublishAction {
	fn name(&self) -> &str {
		"Publish"
	}

	async fn run(&self, records: &[Record]) -> AdminResult<ActionOutcome> {
		Ok(ActionOutcome::Message { message: format!("published {} tasks", records.len()) })
	}
}

struct BrokenAction;

#[async_trait]
impl Action for BrokenAction {
	fn name(&self) -> &str {
		"Broken"
	}

	async fn run(&self, _records: &[Record]) -> AdminResult<ActionOutcome> {
		Err(AdminError::Database("backend exploded".into()))
	}
}

// ---- harness ----

const SCHEMA: &[&str] = &[
	"CREATE TABLE tasks (id INTEGER PRIMARY KEY, title TEXT, done INTEGER, due_at TEXT, created_at TEXT)",
	"CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, deleted_at TEXT, created_at TEXT)",
	"CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
	"CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, author_id INTEGER)",
	"CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT)",
	"CREATE TABLE post_tag (post_id INTEGER, tag_id INTEGER)",
	"CREATE TABLE comments (id INTEGER PRIMARY KEY, body TEXT, commentable_type TEXT, commentable_id INTEGER)",
	"CREATE TABLE wizards (id INTEGER PRIMARY KEY, type TEXT, is_locked INTEGER, parent_id INTEGER, secret TEXT)",
	"CREATE TABLE action_events (batch_id TEXT, user_id TEXT, name TEXT, actionable_type TEXT, \
	 actionable_id TEXT, target_type TEXT, target_id TEXT, model_type TEXT, model_id TEXT, \
	 fields TEXT, status TEXT, exception TEXT, original TEXT, changes TEXT)",
];

fn registry() -> Arc<ResourceRegistry> {
	let registry = ResourceRegistry::new();
	registry.register(Arc::new(TaskResource)).unwrap();
	registry.register(Arc::new(NoteResource)).unwrap();
	registry.register(Arc::new(UserResource)).unwrap();
	registry.register(Arc::new(PostResource)).unwrap();
	registry.register(Arc::new(TagResource)).unwrap();
	registry.register(Arc::new(CommentResource)).unwrap();
	registry.register(Arc::new(WizardResource)).unwrap();
	Arc::new(registry)
}

async fn harness() -> (ResourceService, Database) {
	let conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
	let database = Database::new(Arc::new(conn));
	for ddl in SCHEMA {
		database.execute_raw(ddl).await.unwrap();
	}
	let service = ResourceService::new(
		registry(),
		database.clone(),
		Arc::new(AllowAll),
		AdminConfig::default(),
	);
	(service, database)
}

async fn seed_tasks(database: &Database, count: u64) {
	for i in 0..count {
		database
			.execute_raw(&format!(
				"INSERT INTO tasks (id, title, done, due_at, created_at) VALUES ({id}, \
				 'Task {i}', {done}, '2026-01-{day:02}T00:00:00Z', '2026-01-{day:02}T00:00:00Z')",
				id = i + 1,
				done = i % 2,
				day = (i % 28) + 1,
			))
			.await
			.unwrap();
	}
}

fn attribute_value(record: &grappelli_types::RecordDescriptor, attribute: &str) -> Value {
	record
		.attributes
		.iter()
		.find(|descriptor| descriptor.attribute == attribute)
		.and_then(|descriptor| descriptor.value.clone())
		.unwrap_or(Value::Null)
}

// ---- listing ----

#[tokio::test]
async fn index_paginates_and_sorts_descending() {
	let (service, database) = harness().await;
	seed_tasks(&database, 25).await;

	let request = IndexQuery::default()
		.with_per_page(10)
		.with_sort("done", SortDirection::Desc);
	let response = service.index("tasks", &Actor::anonymous(), request).await.unwrap();

	assert_eq!(response.count, 25);
	assert_eq!(response.per_page, 10);
	assert_eq!(response.total_pages, 3);
	assert_eq!(response.records.len(), 10);
	for record in &response.records {
		assert_eq!(record.attributes.len(), 3);
		assert_eq!(attribute_value(record, "done"), json!(1));
	}
}

#[tokio::test]
async fn unsorted_index_orders_by_creation_time_descending() {
	let (service, database) = harness().await;
	// creation timestamps deliberately out of primary-key order
	for (id, created_at) in [(1, "2026-03-05"), (2, "2026-03-01"), (3, "2026-03-03")] {
		database
			.execute_raw(&format!(
				"INSERT INTO tasks (id, title, done, due_at, created_at) VALUES ({id}, \
				 'Task', 0, '2026-01-01T00:00:00Z', '{created_at}T00:00:00Z')"
			))
			.await
			.unwrap();
	}

	let response = service
		.index("tasks", &Actor::anonymous(), IndexQuery::default())
		.await
		.unwrap();
	let ids: Vec<Value> = response.records.iter().map(|r| r.id.clone()).collect();
	assert_eq!(ids, vec![json!(1), json!(3), json!(2)]);
}

#[tokio::test]
async fn unsorted_index_falls_back_to_the_primary_key_without_a_creation_column() {
	let (service, database) = harness().await;
	for (id, name) in [(1, "rust"), (2, "admin")] {
		database
			.execute_raw(&format!("INSERT INTO tags (id, name) VALUES ({id}, '{name}')"))
			.await
			.unwrap();
	}

	let response = service
		.index("tags", &Actor::anonymous(), IndexQuery::default())
		.await
		.unwrap();
	let ids: Vec<Value> = response.records.iter().map(|r| r.id.clone()).collect();
	assert_eq!(ids, vec![json!(2), json!(1)]);
}

#[tokio::test]
async fn index_rejects_page_sizes_outside_the_allowed_set() {
	let (service, database) = harness().await;
	seed_tasks(&database, 30).await;

	let request = IndexQuery::default().with_per_page(33);
	let response = service.index("tasks", &Actor::anonymous(), request).await.unwrap();

	// 33 is not in the resource's per-page options; the default applies
	assert_eq!(response.per_page, 25);
	assert_eq!(response.records.len(), 25);
}

#[tokio::test]
async fn index_searches_declared_columns() {
	let (service, database) = harness().await;
	seed_tasks(&database, 25).await;

	let request = IndexQuery::default().with_search("Task 1");
	let response = service.index("tasks", &Actor::anonymous(), request).await.unwrap();

	// Task 1, Task 10 .. Task 19
	assert_eq!(response.count, 11);
}

#[tokio::test]
async fn search_treats_like_metacharacters_literally() {
	let (service, database) = harness().await;
	seed_tasks(&database, 5).await;
	database
		.execute_raw(
			"INSERT INTO tasks (id, title, done, due_at) VALUES (6, '100% done', 0, \
			 '2026-01-06T00:00:00Z')",
		)
		.await
		.unwrap();

	// a bare wildcard must only match titles containing a literal one
	let request = IndexQuery::default().with_search("%");
	let response = service.index("tasks", &Actor::anonymous(), request).await.unwrap();
	assert_eq!(response.count, 1);
}

#[tokio::test]
async fn index_applies_column_and_range_filters() {
	let (service, database) = harness().await;
	seed_tasks(&database, 25).await;

	let request = IndexQuery::default().with_filter("title", json!("Task 3"));
	let response = service.index("tasks", &Actor::anonymous(), request).await.unwrap();
	assert_eq!(response.count, 1);

	// range submitted as split from/to keys, folded onto the due_at filter
	let request = IndexQuery::default()
		.with_filter("due_at_from", json!("2026-01-01T00:00:00Z"))
		.with_filter("due_at_to", json!("2026-01-05T23:59:59Z"))
		.with_per_page(50);
	let response = service.index("tasks", &Actor::anonymous(), request).await.unwrap();
	assert_eq!(response.count, 5);
}

#[tokio::test]
async fn index_silently_ignores_unknown_filters() {
	let (service, database) = harness().await;
	seed_tasks(&database, 5).await;

	let request = IndexQuery::default().with_filter("no_such_filter", json!("x"));
	let response = service.index("tasks", &Actor::anonymous(), request).await.unwrap();
	assert_eq!(response.count, 5);
}

#[tokio::test]
async fn index_requires_the_view_any_ability() {
	let (_, database) = harness().await;
	let service = ResourceService::new(
		registry(),
		database,
		Arc::new(DenyAll),
		AdminConfig::default(),
	);

	let err = service
		.index("tasks", &Actor::anonymous(), IndexQuery::default())
		.await
		.unwrap_err();
	assert!(matches!(err, AdminError::PermissionDenied(_)));
}

#[tokio::test]
async fn unknown_resources_are_a_404() {
	let (service, _) = harness().await;
	let err = service
		.index("bogus", &Actor::anonymous(), IndexQuery::default())
		.await
		.unwrap_err();
	assert_eq!(err.status_code(), 404);
}

// ---- crud and soft deletes ----

#[tokio::test]
async fn create_validates_then_persists() {
	let (service, _) = harness().await;
	let actor = Actor::with_id(7);

	let err = service
		.create("tasks", &actor, MutationRequest::from_pairs([("done", json!(false))]))
		.await
		.unwrap_err();
	let AdminError::Validation(errors) = err else { panic!("expected validation error") };
	assert!(!errors.get("title").is_empty());

	let response = service
		.create(
			"tasks",
			&actor,
			MutationRequest::from_pairs([("title", json!("Ship it")), ("done", json!(false))]),
		)
		.await
		.unwrap();
	assert!(response.success);
	assert_eq!(response.affected, Some(1));

	let listing = service.index("tasks", &actor, IndexQuery::default()).await.unwrap();
	assert_eq!(listing.count, 1);
}

#[tokio::test]
async fn update_checks_existence_before_anything_else() {
	let (service, _) = harness().await;
	let err = service
		.update(
			"tasks",
			&Actor::anonymous(),
			&json!(99),
			MutationRequest::from_pairs([("title", json!("nope"))]),
		)
		.await
		.unwrap_err();
	assert!(matches!(err, AdminError::RecordNotFound { .. }));
}

#[tokio::test]
async fn soft_delete_restore_and_force_delete_lifecycle() {
	let (service, _) = harness().await;
	let actor = Actor::with_id(1);

	for body in ["first", "second", "third"] {
		service
			.create("notes", &actor, MutationRequest::from_pairs([("body", json!(body))]))
			.await
			.unwrap();
	}

	service.delete("notes", &actor, &json!(1)).await.unwrap();

	let active = service.index("notes", &actor, IndexQuery::default()).await.unwrap();
	assert_eq!(active.count, 2);

	let trashed = service
		.index("notes", &actor, IndexQuery::default().with_trashed("only"))
		.await
		.unwrap();
	assert_eq!(trashed.count, 1);
	assert!(trashed.records[0].deleted_at.is_some());

	let everything = service
		.index("notes", &actor, IndexQuery::default().with_trashed("with"))
		.await
		.unwrap();
	assert_eq!(everything.count, 3);

	service.restore("notes", &actor, &json!(1)).await.unwrap();
	let active = service.index("notes", &actor, IndexQuery::default()).await.unwrap();
	assert_eq!(active.count, 3);

	service.force_delete("notes", &actor, &json!(1)).await.unwrap();
	let everything = service
		.index("notes", &actor, IndexQuery::default().with_trashed("with"))
		.await
		.unwrap();
	assert_eq!(everything.count, 2);
}

#[tokio::test]
async fn force_delete_rejects_resources_without_soft_deletes() {
	let (service, database) = harness().await;
	seed_tasks(&database, 1).await;

	let err = service
		.force_delete("tasks", &Actor::anonymous(), &json!(1))
		.await
		.unwrap_err();
	assert!(matches!(err, AdminError::UnsupportedOperation(_)));
}

#[tokio::test]
async fn bulk_delete_reports_affected_rows() {
	let (service, database) = harness().await;
	seed_tasks(&database, 5).await;

	let response = service
		.bulk_delete(
			"tasks",
			&Actor::anonymous(),
			grappelli_types::BulkDeleteRequest { ids: vec!["1".into(), "3".into(), "99".into()] },
		)
		.await
		.unwrap();
	assert_eq!(response.affected, Some(2));

	let listing = service
		.index("tasks", &Actor::anonymous(), IndexQuery::default())
		.await
		.unwrap();
	assert_eq!(listing.count, 3);
}

#[tokio::test]
async fn detail_transforms_a_single_record() {
	let (service, database) = harness().await;
	seed_tasks(&database, 3).await;

	let detail = service.detail("tasks", &Actor::anonymous(), &json!(2)).await.unwrap();
	assert_eq!(detail.resource, "tasks");
	assert_eq!(detail.record.id, json!(2));
	assert_eq!(attribute_value(&detail.record, "title"), json!("Task 1"));
	assert!(detail.record.permissions.view);
}

// ---- audit log ----

#[tokio::test]
async fn mutations_leave_an_audit_trail() {
	let (service, database) = harness().await;
	let actor = Actor::with_id(42);

	service
		.create("notes", &actor, MutationRequest::from_pairs([("body", json!("draft"))]))
		.await
		.unwrap();
	service
		.update(
			"notes",
			&actor,
			&json!(1),
			MutationRequest::from_pairs([("body", json!("final"))]),
		)
		.await
		.unwrap();
	service.delete("notes", &actor, &json!(1)).await.unwrap();

	let rows = events::recent_events(&database, 10).await.unwrap();
	let names: Vec<&str> =
		rows.iter().filter_map(|row| row.get("name").and_then(Value::as_str)).collect();
	assert_eq!(names, vec!["Delete", "Update", "Create"]);

	let update = &rows[1];
	assert_eq!(update.get("status"), Some(&json!("finished")));
	let changes = update.get("changes").and_then(Value::as_str).unwrap();
	assert!(changes.contains("final"));
	let original = update.get("original").and_then(Value::as_str).unwrap();
	assert!(original.contains("draft"));
}

// ---- options and attachments ----

#[tokio::test]
async fn belongs_to_options_list_related_records() {
	let (service, database) = harness().await;
	for (id, name) in [(1, "Ada"), (2, "Grace")] {
		database
			.execute_raw(&format!("INSERT INTO users (id, name) VALUES ({id}, '{name}')"))
			.await
			.unwrap();
	}

	let options = service
		.field_options("posts", "author", &Actor::anonymous(), &OptionsQuery::default())
		.await
		.unwrap();
	let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
	assert_eq!(labels, vec!["Ada", "Grace"]);
}

#[tokio::test]
async fn attachable_listing_is_empty_safe() {
	let (service, database) = harness().await;
	database.execute_raw("INSERT INTO posts (id, title) VALUES (1, 'Hello')").await.unwrap();

	// no tags exist and nothing is attached; both listings succeed empty
	let items = service
		.attachable_items("posts", &json!(1), "tags", &Actor::anonymous(), &OptionsQuery::default())
		.await
		.unwrap();
	assert!(items.is_empty());
}

#[tokio::test]
async fn attach_detach_roundtrip_through_the_pivot() {
	let (service, database) = harness().await;
	let actor = Actor::with_id(1);
	database.execute_raw("INSERT INTO posts (id, title) VALUES (1, 'Hello')").await.unwrap();
	for (id, name) in [(1, "rust"), (2, "admin"), (3, "sql")] {
		database
			.execute_raw(&format!("INSERT INTO tags (id, name) VALUES ({id}, '{name}')"))
			.await
			.unwrap();
	}

	let candidates = service
		.attachable_items("posts", &json!(1), "tags", &actor, &OptionsQuery::default())
		.await
		.unwrap();
	assert_eq!(candidates.len(), 3);

	let response = service
		.attach(
			"posts",
			&json!(1),
			"tags",
			&actor,
			&AttachRequest { ids: vec![json!(1), json!(2)], pivot: Default::default() },
		)
		.await
		.unwrap();
	assert_eq!(response.affected, Some(2));

	// already-attached ids are skipped, not duplicated
	let response = service
		.attach(
			"posts",
			&json!(1),
			"tags",
			&actor,
			&AttachRequest { ids: vec![json!(2), json!(3)], pivot: Default::default() },
		)
		.await
		.unwrap();
	assert_eq!(response.affected, Some(1));

	let candidates = service
		.attachable_items("posts", &json!(1), "tags", &actor, &OptionsQuery::default())
		.await
		.unwrap();
	assert!(candidates.is_empty());

	let response = service
		.detach(
			"posts",
			&json!(1),
			"tags",
			&actor,
			&DetachRequest { ids: vec![json!(1), json!(2), json!(3)] },
		)
		.await
		.unwrap();
	assert_eq!(response.affected, Some(3));

	let candidates = service
		.attachable_items("posts", &json!(1), "tags", &actor, &OptionsQuery::default())
		.await
		.unwrap();
	assert_eq!(candidates.len(), 3);
}

#[tokio::test]
async fn morph_options_resolve_one_target_type() {
	let (service, database) = harness().await;
	database.execute_raw("INSERT INTO posts (id, title) VALUES (1, 'Hello')").await.unwrap();
	database.execute_raw("INSERT INTO posts (id, title) VALUES (2, 'World')").await.unwrap();

	let options = service
		.morph_options("comments", "commentable", "post", &Actor::anonymous(), &OptionsQuery::default())
		.await
		.unwrap();
	assert_eq!(options.len(), 2);
	assert_eq!(options[0].label, "Hello");

	let err = service
		.morph_options("comments", "commentable", "gadget", &Actor::anonymous(), &OptionsQuery::default())
		.await
		.unwrap_err();
	assert!(matches!(err, AdminError::UnsupportedOperation(_)));
}

// ---- metadata ----

#[tokio::test]
async fn dependency_metadata_lists_observed_fields_in_order() {
	let (service, _) = harness().await;

	let response = service.fields("wizards", View::Creation).unwrap();
	let secret = response.fields.iter().find(|f| f.key == "secret").unwrap();
	let dependency = secret.dependency.as_ref().unwrap();

	assert_eq!(dependency.fields, vec!["type", "is_locked", "parent_id"]);
	assert_eq!(dependency.visibility.len(), 1);
	assert_eq!(dependency.disabled.len(), 1);
	assert_eq!(dependency.required.len(), 1);
}

#[tokio::test]
async fn morph_filter_splits_into_type_and_target_selects() {
	let (service, _) = harness().await;

	let response = service.filters("comments").unwrap();
	let morph: Vec<_> = response
		.filters
		.iter()
		.filter(|f| f.key.starts_with("commentable"))
		.collect();

	assert_eq!(morph.len(), 2);
	assert_eq!(morph[0].key, "commentable_type");
	assert_eq!(morph[0].options.len(), 2);
	assert_eq!(morph[1].key, "commentable_id");
	assert!(morph[1].endpoint.as_deref().unwrap().contains("{morphType}"));
	assert_eq!(morph[1].depends_on, vec!["commentable_type"]);
}

#[tokio::test]
async fn resource_info_lists_index_columns() {
	let (service, _) = harness().await;

	let info = service.info("tasks").unwrap();
	assert_eq!(info.key, "tasks");
	assert!(!info.soft_deletes);
	assert_eq!(info.per_page_options, vec![10, 25, 50]);
	let columns: Vec<&str> = info.columns.iter().map(|c| c.field.as_str()).collect();
	assert_eq!(columns, vec!["title", "done", "due_at"]);
	assert!(info.columns[1].sortable);
	assert!(!info.columns[0].sortable);
}

// ---- actions ----

#[tokio::test]
async fn run_action_dispatches_and_logs_per_record() {
	let (service, database) = harness().await;
	seed_tasks(&database, 3).await;
	let actor = Actor::with_id(9);

	let outcome = service
		.run_action(
			"tasks",
			"publish",
			&actor,
			&ActionRequest { ids: vec![json!(1), json!(2)], fields: Default::default() },
		)
		.await
		.unwrap();
	assert_eq!(outcome, ActionOutcome::Message { message: "published 2 tasks".into() });

	let rows = events::recent_events(&database, 10).await.unwrap();
	let published = rows
		.iter()
		.filter(|row| row.get("name") == Some(&json!("Publish")))
		.count();
	assert_eq!(published, 2);
}

#[tokio::test]
async fn failing_actions_come_back_as_danger_outcomes() {
	let (service, database) = harness().await;
	seed_tasks(&database, 1).await;

	let outcome = service
		.run_action(
			"tasks",
			"broken",
			&Actor::anonymous(),
			&ActionRequest { ids: vec![json!(1)], fields: Default::default() },
		)
		.await
		.unwrap();
	assert!(matches!(outcome, ActionOutcome::Danger { .. }));
}

#[tokio::test]
async fn unknown_actions_are_rejected() {
	let (service, _) = harness().await;
	let err = service
		.run_action("tasks", "vanish", &Actor::anonymous(), &ActionRequest::default())
		.await
		.unwrap_err();
	assert!(matches!(err, AdminError::UnsupportedOperation(_)));
}

#[tokio::test]
async fn path_segments_parse_to_primary_key_values() {
	assert_eq!(parse_id("15"), json!(15));
	assert_eq!(parse_id("a1b2"), json!("a1b2"));
}
