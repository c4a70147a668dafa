//! Core of the Grappelli admin framework
//!
//! This crate turns declarative [`resource::Resource`] definitions into
//! authorized, paginated JSON responses:
//!
//! - [`fields`] — the field DSL: visibility, defaults, validation rules,
//!   dependency graphs, relation metadata
//! - [`filters`] — the polymorphic filter hierarchy translating submitted
//!   values into query constraints
//! - [`registry`] — the explicit, dependency-injected resource registry
//! - [`pipeline`] — the fixed-order index request pipeline
//! - [`options`] / [`attachment`] — option resolution and many-to-many
//!   link management for relation fields
//! - [`events`] — the action-event audit log
//!
//! The ORM/query-builder boundary is [`connection::Connection`]; queries
//! are built with `sea-query` and rendered per backend.

pub mod actions;
pub mod attachment;
pub mod auth;
pub mod config;
pub mod connection;
pub mod database;
pub mod events;
pub mod fields;
pub mod filters;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod resource;
pub mod util;

pub use auth::{Ability, Actor, AllowAll, DenyAll, Gate};
pub use config::AdminConfig;
pub use connection::{Backend, Connection};
pub use database::Database;
pub use registry::ResourceRegistry;
pub use resource::Resource;

#[cfg(feature = "sqlite")]
pub use connection::sqlite::SqliteConnection;
