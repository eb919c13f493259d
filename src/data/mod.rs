//! Data layer: rate snapshots, the in-memory history, its JSON file and the
//! remote rate provider.

mod models;
mod source;
mod storage;
mod store;

pub use models::BASE_CURRENCY;
#[cfg(test)]
pub use models::Snapshot;
pub use source::{HttpRateSource, RateSource};
pub use storage::Storage;
pub use store::{RateStore, Upsert};
