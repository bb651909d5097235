//! SQL text handling: built-in queries and user query validation

pub mod catalog;
pub mod query;

pub use catalog::{BuiltinQuery, QueryCatalog};
pub use query::{QueryType, SqlQuery};
