//! # Grappelli
//!
//! An admin-resource framework for Rust. Database-backed "resources" are
//! described declaratively — fields, filters, actions, relationships — and
//! Grappelli turns those definitions into authorized, paginated JSON
//! responses through an explicit, fixed-order request pipeline.
//!
//! ## Core Principles
//!
//! - **Composition over Inheritance**: a single concrete [`Field`] struct
//!   plus small capability traits instead of flattened mixins
//! - **Explicit over Ambient**: the resource registry is a plain value you
//!   construct and pass around, never process-global state
//! - **Declarative dependencies**: cross-field visibility/required/disabled
//!   rules are serialized metadata for the client, not server-side logic
//! - **Async-First**: built on tokio and async/await from the ground up
//!
//! ## Crate layout
//!
//! - [`grappelli_types`] — error taxonomy, request parameters, transport DTOs
//! - [`grappelli_core`] — fields, filters, resources, registry, pipeline,
//!   option/attachment services, audit events
//! - [`grappelli_api`] — the service layer exposing the HTTP-facing contract
//!
//! [`Field`]: grappelli_core::fields::Field

pub use grappelli_api as api;
pub use grappelli_core as core;
pub use grappelli_types as types;

/// Commonly used items, importable in one line.
pub mod prelude {
	pub use grappelli_api::ResourceService;
	pub use grappelli_core::auth::{Ability, Actor, AllowAll, Gate};
	pub use grappelli_core::config::AdminConfig;
	pub use grappelli_core::database::Database;
	pub use grappelli_core::fields::{Field, FieldContext, FieldType, Rule, Section, View};
	pub use grappelli_core::filters::{
		BooleanFilter, ColumnFilter, DynamicSelectFilter, ExistsFilter, Filter, MorphFilter,
		RangeFilter, RelationFilter, SelectFilter,
	};
	pub use grappelli_core::registry::ResourceRegistry;
	pub use grappelli_core::resource::Resource;
	pub use grappelli_types::{AdminError, AdminResult};
}
