//! Local storage of ingested blocks and transaction results.

pub mod errors;
#[cfg(feature = "stubs")]
pub mod stubs;
pub mod store_sled;
pub mod traits;

pub use errors::{DbError, DbResult};
pub use store_sled::{SledStorage, SLED_NAME};
pub use traits::{Storage, WriteBatch};
