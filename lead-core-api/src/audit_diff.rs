use lead_core_db::{AuditDiff, FieldChange, TrackedField, TrackedFields};

/// Compares two snapshots over the given tracked fields.
///
/// Only fields whose normalized values differ appear in the result, in the
/// order of `tracked`. Fields outside `tracked` are never reported.
pub fn diff<B, A>(before: &B, after: &A, tracked: &[TrackedField]) -> AuditDiff
where
    B: TrackedFields + ?Sized,
    A: TrackedFields + ?Sized,
{
    let changes = tracked
        .iter()
        .filter_map(|field| {
            let old = before.tracked_value(*field);
            let new = after.tracked_value(*field);
            (old != new).then(|| (*field, FieldChange { before: old, after: new }))
        })
        .collect();
    AuditDiff::Changes(changes)
}
