//! LabDesk client library
//!
//! Typed access to the LabDesk REST API:
//! - `ApiClient` for list, detail and mutation calls
//! - `ListLoader` for debounced, race-free table loading
//! - `Flash` for one-shot success and error messages

pub mod client;
pub mod error;
pub mod flash;
pub mod loader;

pub use client::{ApiClient, Filters, Mutation};
pub use error::{ClientError, Result, FALLBACK_MESSAGE};
pub use flash::{Flash, FlashKind, FlashMessage};
pub use loader::{ListLoader, ListSource, ResourceList, DEBOUNCE};
