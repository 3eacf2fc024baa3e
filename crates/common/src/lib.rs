//! Utilities shared by the tokenscout binaries.

pub mod logging;
