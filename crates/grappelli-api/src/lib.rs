//! Service layer of the Grappelli admin framework
//!
//! This crate turns the core building blocks into the request surface an
//! HTTP layer would mount: one [`ResourceService`] per deployment, with an
//! async method per endpoint of the admin contract. All input validation,
//! authorization, and audit logging happens here so transports stay thin.
//!
//! # Examples
//!
//! ```no_run
//! use grappelli_api::ResourceService;
//! use grappelli_core::config::AdminConfig;
//! use grappelli_core::{AllowAll, Database, ResourceRegistry};
//! use std::sync::Arc;
//!
//! # async fn wire(database: Database) -> grappelli_types::AdminResult<()> {
//! let registry = Arc::new(ResourceRegistry::new());
//! let service = ResourceService::new(
//! 	registry,
//! 	database,
//! 	Arc::new(AllowAll),
//! 	AdminConfig::default(),
//! );
//! let info = service.info("users")?;
//! # Ok(())
//! # }
//! ```

pub mod service;
pub mod validation;

pub use service::{parse_id, ResourceService};
