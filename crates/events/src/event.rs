use chrono::{DateTime, Utc};

/// A message describing something that already happened in the storefront.
///
/// Payloads are snapshots, never deltas, so a consumer that misses one catches
/// up on the next.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted routing name, e.g. `catalog.top_products.updated`.
    fn event_type(&self) -> &'static str;

    /// Bumped whenever the payload shape changes.
    fn version(&self) -> u32;

    fn occurred_at(&self) -> DateTime<Utc>;
}
