//! Little Lemon: restaurant menu client with a local search cache.
//!
//! The menu is downloaded once into SQLite, then searched and filtered
//! locally. The user profile lives in the same database as a single JSON
//! record.

pub mod config;
pub mod error;
pub mod menu;
pub mod profile;
pub mod storage;

pub use error::AppError;
