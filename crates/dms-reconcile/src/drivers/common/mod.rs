//! Utilities shared by the database drivers.
//!
//! - [`tls`]: rustls connector for PostgreSQL connections

pub mod tls;

pub use tls::{pg_connector, SslMode};
