//! # Backends
//!
//! | Backend | Storage | Directory size |
//! |---------|---------|----------------|
//! | [`FlatRecordStore`] | sled tree keyed by full path, one per namespace | sum of descendant file sizes |
//! | [`TreeNodeStore`] | in-memory node tree under a lock | number of direct children |

mod flat;
mod tree;
mod txn;

pub use flat::FlatRecordStore;
pub use tree::TreeNodeStore;
