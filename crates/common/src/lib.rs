//! LabDesk Common Library
//!
//! Shared code for the LabDesk API server and client including:
//! - Database entities, the listing contract and the generic repository
//! - Per-resource rules (payloads, filters, checks, detail views)
//! - Error types and handling
//! - Configuration management
//! - Authentication and request context
//! - Localized mutation messages
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod locale;
pub mod metrics;
pub mod validation;

// Re-export commonly used types
pub use auth::{Authenticator, Principal, RequestContext};
pub use config::AppConfig;
pub use db::{DbPool, DetailOptions, ListQuery, Page, Repository, SortOrder};
pub use errors::{AppError, Result};
pub use locale::Locale;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
