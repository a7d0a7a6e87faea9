//! Durable output of a deployment run: the final name-to-address mapping
//! plus migration artifacts, written once and consumed read-only by later
//! runs and scripts.

mod record;
mod store;

pub use record::{MigrationArtifacts, OutputRecord};
pub use store::{OutputError, OutputStore};
