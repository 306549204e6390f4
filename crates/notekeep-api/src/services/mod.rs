//! Service layer for business logic.

pub mod note_service;
pub mod tag_reconciler;
pub mod tag_resolver;

pub use note_service::NoteService;
pub use tag_reconciler::{ReconcileReport, TagReconciler};
pub use tag_resolver::{ResolvedTag, TagResolver};
