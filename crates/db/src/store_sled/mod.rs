//! Sled backend.

mod db;
mod init;
mod schema;

pub use db::{SledStorage, SledWriteBatch};
pub use init::open_sled_database;

pub const SLED_NAME: &str = "tokenscout";
