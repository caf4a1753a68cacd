//! Core abstractions for engine-agnostic reconciliation.
//!
//! - [`schema`]: table identity and primary key metadata
//! - [`value`]: owned SQL values and their canonical form
//! - [`rows`]: tabular query results
//! - [`traits`]: the [`Dialect`] and [`QueryPool`] seams implemented per engine
//! - [`identifier`]: validation of names spliced into generated SQL

pub mod identifier;
pub mod rows;
pub mod schema;
pub mod traits;
pub mod value;

pub use rows::RowSet;
pub use schema::{MigrationUnit, PrimaryKey};
pub use traits::{quote_string, Dialect, QueryPool};
pub use value::SqlValue;
