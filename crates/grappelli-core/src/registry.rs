//! The resource registry
//!
//! Resources are registered explicitly at startup and looked up by uri key
//! for the rest of the process lifetime. The map is read-heavy after
//! startup, so it sits behind a `parking_lot::RwLock`.

use crate::resource::Resource;
use grappelli_types::{AdminError, AdminResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Key -> resource map shared across requests
///
/// # Examples
///
/// ```
/// use grappelli_core::{ResourceRegistry, Resource};
/// use grappelli_core::fields::{Field, FieldContext, FieldElement};
/// use std::sync::Arc;
///
/// struct UserResource;
///
/// impl Resource for UserResource {
///     fn name(&self) -> &str { "UserResource" }
///     fn table(&self) -> &str { "users" }
///     fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
///         vec![Field::text("Name", "name").into()]
///     }
/// }
///
/// let registry = ResourceRegistry::new();
/// registry.register(Arc::new(UserResource)).unwrap();
/// assert!(registry.get("users").is_some());
/// ```
#[derive(Default)]
pub struct ResourceRegistry {
	resources: RwLock<HashMap<String, Arc<dyn Resource>>>,
}

impl ResourceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a resource under its derived uri key.
	///
	/// Fails fast on key collision, naming both resources; two resource
	/// types must never race for the same route segment.
	pub fn register(&self, resource: Arc<dyn Resource>) -> AdminResult<()> {
		let key = resource.uri_key();
		let mut resources = self.resources.write();
		if let Some(existing) = resources.get(&key) {
			return Err(AdminError::Registration(format!(
				"uri key '{key}' is already taken: cannot register '{}' over '{}'",
				resource.name(),
				existing.name()
			)));
		}
		tracing::debug!(key = %key, resource = resource.name(), "registered resource");
		resources.insert(key, resource);
		Ok(())
	}

	/// Resource registered under a uri key
	pub fn get(&self, key: &str) -> Option<Arc<dyn Resource>> {
		self.resources.read().get(key).cloned()
	}

	/// Like [`get`](Self::get) but mapping a miss to `ResourceNotFound`
	pub fn resolve(&self, key: &str) -> AdminResult<Arc<dyn Resource>> {
		self.get(key)
			.ok_or_else(|| AdminError::ResourceNotFound(key.to_string()))
	}

	/// All registered keys, sorted
	pub fn keys(&self) -> Vec<String> {
		let mut keys: Vec<String> = self.resources.read().keys().cloned().collect();
		keys.sort();
		keys
	}

	/// All registered resources, sorted by key
	pub fn resources(&self) -> Vec<Arc<dyn Resource>> {
		let resources = self.resources.read();
		let mut entries: Vec<(&String, &Arc<dyn Resource>)> = resources.iter().collect();
		entries.sort_by(|a, b| a.0.cmp(b.0));
		entries.into_iter().map(|(_, r)| Arc::clone(r)).collect()
	}

	pub fn len(&self) -> usize {
		self.resources.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.resources.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fields::{Field, FieldContext, FieldElement};

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
	}

	// different type, same derived key as UserResource
	struct LegacyUserResource;

	impl Resource for LegacyUserResource {
		fn name(&self) -> &str {
			"UserResource"
		}

		fn table(&self) -> &str {
			"legacy_users"
		}

		fn fields(&self, _ctx: &FieldContext) -> Vec<FieldElement> {
			Vec::new()
		}
	}

	#[test]
	fn register_and_resolve_round_trip() {
		let registry = ResourceRegistry::new();
		registry.register(Arc::new(UserResource)).unwrap();

		assert_eq!(registry.keys(), vec!["users".to_string()]);
		assert_eq!(registry.resolve("users").unwrap().table(), "users");
		assert!(matches!(
			registry.resolve("ghosts"),
			Err(AdminError::ResourceNotFound(_))
		));
	}

	#[test]
	fn key_collision_fails_fast_and_names_both_resources() {
		let registry = ResourceRegistry::new();
		registry.register(Arc::new(UserResource)).unwrap();

		let err = registry.register(Arc::new(LegacyUserResource)).unwrap_err();
		let message = err.to_string();
		assert!(message.contains("users"));
		assert!(message.contains("UserResource"));
		// the original registration is untouched
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.resolve("users").unwrap().table(), "users");
	}
}
