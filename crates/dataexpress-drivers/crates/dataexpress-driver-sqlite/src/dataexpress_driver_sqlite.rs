//! SQLite driver implementation

mod adapter;
mod connection;

#[cfg(test)]
mod connection_tests;

pub use adapter::SqliteAdapter;
pub use connection::SqliteConnection;
