//! Database initialization and schema

mod init;

pub use init::{create_schema, init_database};
