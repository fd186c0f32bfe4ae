//! Database schema and row models

#[cfg(feature = "sqlx")]
pub mod init;
pub mod models;

#[cfg(feature = "sqlx")]
pub use init::*;
pub use models::*;
