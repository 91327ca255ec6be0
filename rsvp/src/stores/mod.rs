//! Provider implementations backed by real storage.

pub mod postgres;

pub use postgres::PostgresStore;
