//! Query-side introspection shared by the catalog views.

/// A view that can report its size without blocking.
///
/// `count` is best effort: while a writer holds the view's lock it may
/// report 0 instead of waiting.
pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Documents (or counters, for statistics) currently held.
    fn count(&self) -> usize;
}
