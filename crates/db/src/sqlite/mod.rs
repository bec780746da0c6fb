//! SQLite-Implementierung der Repositories

mod benutzer;
mod pool;
mod sessions;

pub use pool::SqliteDb;
