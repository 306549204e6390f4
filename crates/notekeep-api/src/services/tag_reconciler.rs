//! Converges a note's tag associations on a desired list of names.
//!
//! Associations are diffed rather than replaced: tags that stay on the note
//! keep their existing rows, only missing ones are linked and only stale ones
//! are unlinked. Every name is resolved before the first association write, so
//! a resolution failure leaves the associations untouched.

use std::collections::BTreeSet;

use notekeep_core::{
    normalize_tag_names, AssociationStore, LinkOutcome, NoteId, Result, TagId, TagStore,
};
use tracing::{debug, trace};

use super::tag_resolver::TagResolver;

/// What a reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Tags newly associated with the note
    pub added: Vec<TagId>,
    /// Tags no longer associated with the note
    pub removed: Vec<TagId>,
    /// Tags that were already associated and left as is
    pub retained: Vec<TagId>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct TagReconciler {
    resolver: TagResolver,
}

impl TagReconciler {
    pub fn new(resolver: TagResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &TagResolver {
        &self.resolver
    }

    /// Make the note's associations equal to the normalized set of `desired`.
    ///
    /// Blank names are dropped and duplicates (after normalization) collapse
    /// to one. The note must exist within `store`'s unit of work.
    pub async fn reconcile<S, N>(
        &self,
        store: &mut S,
        note_id: NoteId,
        desired: &[N],
    ) -> Result<ReconcileReport>
    where
        S: TagStore + AssociationStore + ?Sized,
        N: AsRef<str> + Sync,
    {
        let names = normalize_tag_names(desired);

        let mut target = BTreeSet::new();
        for name in &names {
            let resolved = self.resolver.resolve(&mut *store, name).await?;
            target.insert(resolved.id);
        }

        let current = store.tag_ids_for_note(note_id).await?;
        let mut report = ReconcileReport::default();

        for &tag_id in target.difference(&current) {
            match store.link(note_id, tag_id).await? {
                LinkOutcome::Created => report.added.push(tag_id),
                LinkOutcome::AlreadyExists => {
                    trace!(note_id, tag_id, "Association already present");
                    report.retained.push(tag_id);
                }
            }
        }

        for &tag_id in current.difference(&target) {
            store.unlink(note_id, tag_id).await?;
            report.removed.push(tag_id);
        }

        report.retained.extend(current.intersection(&target).copied());
        report.retained.sort_unstable();

        debug!(
            subsystem = "tags",
            component = "tag_reconciler",
            op = "reconcile",
            note_id,
            added = report.added.len(),
            removed = report.removed.len(),
            retained = report.retained.len(),
            "Reconciled note tags"
        );
        Ok(report)
    }
}
