/// Observer for search progress. Purely informational; nothing it does can
/// change how the search proceeds.
pub trait Progress: Send + Sync {
    /// Called once before the first page with the requested record count.
    fn begin(&self, _target: usize) {}

    /// Called after every page with the number of records it contained.
    fn inc(&self, fetched: usize);

    /// Called once when paging ends, whether or not the search succeeded.
    fn finish(&self) {}
}

/// Default observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn inc(&self, _fetched: usize) {}
}
