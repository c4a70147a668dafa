//! Shared types for the Grappelli admin framework
//!
//! This crate holds everything that crosses the wire or an API boundary:
//! the error taxonomy, request parameter types, and the transport
//! descriptors/responses that resources and fields serialize into.

pub mod descriptors;
pub mod errors;
pub mod requests;
pub mod responses;

pub use descriptors::*;
pub use errors::{AdminError, AdminResult, ValidationErrors};
pub use requests::*;
pub use responses::*;

/// A dynamic database record, as returned by the connection boundary.
pub type Record = serde_json::Map<String, serde_json::Value>;
