//! Service layer for Dockyard
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation and the reconciliation with the remote store.

pub mod sync;
pub mod template;

pub use sync::{merge_remote, RemoteHandle, SyncReport, SyncService};
pub use template::{TemplateDraft, TemplateService};
