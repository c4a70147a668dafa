//! Authorization boundary
//!
//! The policy subsystem is an external collaborator; the core only needs a
//! yes/no answer per ability. Checks run before any query execution or
//! mutation, and pipeline stages never re-check internally.

use crate::resource::Resource;
use async_trait::async_trait;
use grappelli_types::{PermissionSet, Record};
use serde::{Deserialize, Serialize};

/// One checkable ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
	ViewAny,
	View,
	Create,
	Update,
	Delete,
	ForceDelete,
	Restore,
	Attach,
	Detach,
	RunAction,
}

/// The acting user, as far as the core needs to know
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
	/// Opaque user identifier
	pub id: Option<serde_json::Value>,
	/// Display name (for audit rows)
	pub name: Option<String>,
}

impl Actor {
	/// An anonymous actor
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// An identified actor
	pub fn with_id(id: impl Into<serde_json::Value>) -> Self {
		Self { id: Some(id.into()), name: None }
	}
}

/// Authorization gate
///
/// The default implementation of every check allows access; override the
/// ones your policy cares about.
#[async_trait]
pub trait Gate: Send + Sync {
	/// May `actor` perform `ability` on `record` of `resource`?
	async fn allows(
		&self,
		ability: Ability,
		resource: &dyn Resource,
		record: Option<&Record>,
		actor: &Actor,
	) -> bool {
		let _ = (ability, resource, record, actor);
		true
	}

	/// Resolve the full per-record permission set for transformation.
	///
	/// `restore` and `force_delete` are gated by soft-delete
	/// applicability: a resource that never soft-deletes reports both as
	/// false regardless of policy.
	async fn permissions(
		&self,
		resource: &dyn Resource,
		record: Option<&Record>,
		actor: &Actor,
	) -> PermissionSet {
		let soft = resource.soft_deletes();
		PermissionSet {
			view: self.allows(Ability::View, resource, record, actor).await,
			update: self.allows(Ability::Update, resource, record, actor).await,
			delete: self.allows(Ability::Delete, resource, record, actor).await,
			force_delete: soft && self.allows(Ability::ForceDelete, resource, record, actor).await,
			restore: soft && self.allows(Ability::Restore, resource, record, actor).await,
			attach: self.allows(Ability::Attach, resource, record, actor).await,
			detach: self.allows(Ability::Detach, resource, record, actor).await,
		}
	}
}

/// Gate that allows everything (the default wiring)
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Gate for AllowAll {}

/// Gate that denies everything (useful in tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[async_trait]
impl Gate for DenyAll {
	async fn allows(
		&self,
		_ability: Ability,
		_resource: &dyn Resource,
		_record: Option<&Record>,
		_actor: &Actor,
	) -> bool {
		false
	}
}
