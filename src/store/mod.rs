//! Pick Store (spec §4.3): append-only JSONL persistence for every
//! emitted pick, plus the atomically-rewritten `weights.json` sidecar.
//!
//! Same durability guarantees as a single-writer WAL store — one mutex
//! serializing writers, schema validation before write, survivable
//! across restarts — applied to a flat-file JSONL layout instead of a
//! SQLite database.

pub mod pick_store;
pub mod weight_store;

pub use pick_store::{PersistOutcome, PickStore, PickStoreError};
pub use weight_store::WeightStore;
