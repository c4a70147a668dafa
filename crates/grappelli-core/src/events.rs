//! The action-event audit log
//!
//! Every tracked mutation (create, update, delete, restore, custom action)
//! produces an immutable [`ActionEvent`] row with before/after snapshots.
//! Persisting an event never fails or blocks the originating request:
//! failures are logged and a best-effort synthetic `failed` row is
//! attempted instead.

use crate::auth::Actor;
use crate::config::ActionEventConfig;
use crate::database::Database;
use grappelli_types::Record;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Table the audit rows are written to
pub const ACTION_EVENTS_TABLE: &str = "action_events";

/// Replacement written over masked attribute values
const MASKED: &str = "********";

/// Lifecycle status of an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
	Running,
	Finished,
	Failed,
}

impl EventStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			EventStatus::Running => "running",
			EventStatus::Finished => "finished",
			EventStatus::Failed => "failed",
		}
	}
}

/// One immutable audit-log entry
///
/// Carries three independent polymorphic references: `actionable` (what
/// ran), `target` (what it was aimed at), and `model` (what was touched).
/// For plain CRUD mutations all three point at the mutated record.
#[derive(Debug, Clone)]
pub struct ActionEvent {
	pub batch_id: Uuid,
	pub user_id: Option<Value>,
	pub name: String,
	pub actionable_type: String,
	pub actionable_id: Value,
	pub target_type: String,
	pub target_id: Value,
	pub model_type: String,
	pub model_id: Value,
	pub fields: Value,
	pub status: EventStatus,
	pub exception: Option<String>,
	pub original: Option<Value>,
	pub changes: Option<Value>,
}

impl ActionEvent {
	fn base(name: &str, resource: &str, actor: &Actor, id: &Value) -> Self {
		Self {
			batch_id: Uuid::new_v4(),
			user_id: actor.id.clone(),
			name: name.to_string(),
			actionable_type: resource.to_string(),
			actionable_id: id.clone(),
			target_type: resource.to_string(),
			target_id: id.clone(),
			model_type: resource.to_string(),
			model_id: id.clone(),
			fields: Value::Array(Vec::new()),
			status: EventStatus::Finished,
			exception: None,
			original: None,
			changes: None,
		}
	}

	/// Audit row for a created record
	pub fn for_create(resource: &str, actor: &Actor, id: &Value, changes: Value) -> Self {
		let mut event = Self::base("Create", resource, actor, id);
		event.changes = Some(changes);
		event
	}

	/// Audit row for an updated record, with before/after snapshots
	pub fn for_update(
		resource: &str,
		actor: &Actor,
		id: &Value,
		original: Value,
		changes: Value,
	) -> Self {
		let mut event = Self::base("Update", resource, actor, id);
		event.original = Some(original);
		event.changes = Some(changes);
		event
	}

	/// Audit row for a deleted record, snapshotting what was removed
	pub fn for_delete(resource: &str, actor: &Actor, id: &Value, original: Value) -> Self {
		let mut event = Self::base("Delete", resource, actor, id);
		event.original = Some(original);
		event
	}

	/// Audit row for a restored record
	pub fn for_restore(resource: &str, actor: &Actor, id: &Value) -> Self {
		Self::base("Restore", resource, actor, id)
	}

	/// Audit row for a custom action run
	pub fn for_action(action_name: &str, resource: &str, actor: &Actor, id: &Value) -> Self {
		Self::base(action_name, resource, actor, id)
	}

	/// Flatten into the persisted column layout
	fn to_row(&self) -> HashMap<String, Value> {
		let mut row = HashMap::new();
		row.insert("batch_id".into(), Value::String(self.batch_id.to_string()));
		row.insert("user_id".into(), self.user_id.clone().unwrap_or(Value::Null));
		row.insert("name".into(), Value::String(self.name.clone()));
		row.insert("actionable_type".into(), Value::String(self.actionable_type.clone()));
		row.insert("actionable_id".into(), self.actionable_id.clone());
		row.insert("target_type".into(), Value::String(self.target_type.clone()));
		row.insert("target_id".into(), self.target_id.clone());
		row.insert("model_type".into(), Value::String(self.model_type.clone()));
		row.insert("model_id".into(), self.model_id.clone());
		row.insert("fields".into(), Value::String(self.fields.to_string()));
		row.insert("status".into(), Value::String(self.status.as_str().into()));
		row.insert("exception".into(), match &self.exception {
			Some(text) => Value::String(text.clone()),
			None => Value::Null,
		});
		row.insert("original".into(), match &self.original {
			Some(snapshot) => Value::String(snapshot.to_string()),
			None => Value::Null,
		});
		row.insert("changes".into(), match &self.changes {
			Some(snapshot) => Value::String(snapshot.to_string()),
			None => Value::Null,
		});
		row
	}
}

/// Mask the configured sensitive attributes inside a snapshot object
fn mask_snapshot(snapshot: &mut Value, exclude: &[String]) {
	if let Value::Object(map) = snapshot {
		for field in exclude {
			if let Some(value) = map.get_mut(field) {
				*value = Value::String(MASKED.into());
			}
		}
	}
}

/// Writes audit rows through the shared connection
#[derive(Clone)]
pub struct ActionEventLogger {
	database: Database,
	config: ActionEventConfig,
}

impl ActionEventLogger {
	pub fn new(database: Database, config: ActionEventConfig) -> Self {
		Self { database, config }
	}

	/// Record one event. Never returns an error and, when queueing is
	/// enabled, never waits for the write.
	pub async fn record(&self, mut event: ActionEvent) {
		if !self.config.enabled {
			return;
		}
		if let Some(original) = &mut event.original {
			mask_snapshot(original, &self.config.exclude_fields);
		}
		if let Some(changes) = &mut event.changes {
			mask_snapshot(changes, &self.config.exclude_fields);
		}
		if self.config.queue {
			let logger = self.clone();
			tokio::spawn(async move {
				logger.write(event).await;
			});
		} else {
			self.write(event).await;
		}
	}

	async fn write(&self, event: ActionEvent) {
		let row = event.to_row();
		if let Err(err) = self.database.create(ACTION_EVENTS_TABLE, row).await {
			tracing::error!(
				batch_id = %event.batch_id,
				name = %event.name,
				error = %err,
				"failed to persist action event"
			);
			// best-effort failure marker; a second failure is only logged
			let mut failed = event;
			failed.status = EventStatus::Failed;
			failed.exception = Some(err.to_string());
			failed.original = None;
			failed.changes = None;
			if let Err(err) = self.database.create(ACTION_EVENTS_TABLE, failed.to_row()).await {
				tracing::error!(error = %err, "failed to persist synthetic failed event");
			}
		}
	}
}

/// Read the last persisted events, newest first. Test and debug helper.
pub async fn recent_events(database: &Database, limit: u64) -> grappelli_types::AdminResult<Vec<Record>> {
	use sea_query::{Alias, Asterisk, Order, Query};

	let query = Query::select()
		.from(Alias::new(ACTION_EVENTS_TABLE))
		.column(Asterisk)
		.order_by(Alias::new("rowid"), Order::Desc)
		.limit(limit)
		.to_owned();
	database.fetch_all(&query).await
}

#[cfg(test)]
mod tests {
	use super::*;

	fn actor() -> Actor {
		Actor { id: Some(serde_json::json!(1)), name: Some("admin".into()) }
	}

	#[test]
	fn create_event_has_a_fresh_batch_id_and_changes_only() {
		let event = ActionEvent::for_create(
			"posts",
			&actor(),
			&serde_json::json!(10),
			serde_json::json!({"title": "hello"}),
		);

		assert_eq!(event.name, "Create");
		assert_eq!(event.status, EventStatus::Finished);
		assert!(event.original.is_none());
		assert_eq!(event.model_id, serde_json::json!(10));

		let other = ActionEvent::for_create(
			"posts",
			&actor(),
			&serde_json::json!(11),
			serde_json::json!({}),
		);
		assert_ne!(event.batch_id, other.batch_id);
	}

	#[test]
	fn row_layout_stringifies_snapshots_and_status() {
		let event = ActionEvent::for_update(
			"posts",
			&actor(),
			&serde_json::json!(10),
			serde_json::json!({"title": "old"}),
			serde_json::json!({"title": "new"}),
		);
		let row = event.to_row();

		assert_eq!(row["status"], serde_json::json!("finished"));
		assert_eq!(row["original"], serde_json::json!(r#"{"title":"old"}"#));
		assert_eq!(row["name"], serde_json::json!("Update"));
		assert_eq!(row["user_id"], serde_json::json!(1));
	}

	#[test]
	fn masking_replaces_sensitive_values_only() {
		let mut snapshot = serde_json::json!({"password": "hunter2", "name": "Alice"});
		mask_snapshot(&mut snapshot, &["password".into(), "secret".into()]);

		assert_eq!(snapshot["password"], serde_json::json!(MASKED));
		assert_eq!(snapshot["name"], serde_json::json!("Alice"));
	}
}
