//! Destinations for deaggregated records.
//!
//! Every deaggregation entry point walks physical records the same way and
//! hands the expansion of each one to a [`RecordSink`]. What happens next
//! depends on the sink:
//!
//! - [`ForEachRecord`] calls a closure once per user record
//! - [`ForEachBatch`] calls a closure once per physical record
//! - `Vec<UserRecord>` collects everything
//!
//! Under [`ErrorPolicy::Skip`](crate::ErrorPolicy::Skip) rejected physical
//! records go to [`RecordSink::reject`], which ignores them by default.

use crate::deaggregator::SkippedRecord;
use crate::types::UserRecord;

/// Receives the user records expanded from physical records.
pub trait RecordSink {
    /// Accepts the user records expanded from one physical record, in order.
    ///
    /// Never called with an empty batch.
    fn accept(&mut self, batch: Vec<UserRecord>);

    /// Receives a physical record dropped under
    /// [`ErrorPolicy::Skip`](crate::ErrorPolicy::Skip).
    fn reject(&mut self, skipped: SkippedRecord) {
        let _ = skipped;
    }
}

impl RecordSink for Vec<UserRecord> {
    fn accept(&mut self, batch: Vec<UserRecord>) {
        self.extend(batch);
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn accept(&mut self, batch: Vec<UserRecord>) {
        (**self).accept(batch);
    }

    fn reject(&mut self, skipped: SkippedRecord) {
        (**self).reject(skipped);
    }
}

/// Sink calling a closure for every user record.
#[derive(Debug, Clone)]
pub struct ForEachRecord<F>(pub F);

impl<F: FnMut(UserRecord)> RecordSink for ForEachRecord<F> {
    fn accept(&mut self, batch: Vec<UserRecord>) {
        batch.into_iter().for_each(&mut self.0);
    }
}

/// Sink calling a closure with the records of each physical record.
#[derive(Debug, Clone)]
pub struct ForEachBatch<F>(pub F);

impl<F: FnMut(Vec<UserRecord>)> RecordSink for ForEachBatch<F> {
    fn accept(&mut self, batch: Vec<UserRecord>) {
        (self.0)(batch);
    }
}
