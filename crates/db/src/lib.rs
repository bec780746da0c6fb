//! pfoertner-db – Datenbank-Schicht
//!
//! Dieses Crate stellt das Repository-Pattern fuer das Auth-Subsystem
//! bereit: Benutzer- und Session-Datensaetze hinter Traits, implementiert
//! auf SQLite. Die Eindeutigkeit von Benutzername und E-Mail wird durch
//! UNIQUE-Constraints im Schema erzwungen, nicht durch Pruefen-dann-Einfuegen
//! in der Anwendungslogik.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

// Bequeme Re-Exporte
pub use error::{DbError, DbResult};
pub use models::{BenutzerRecord, NeueSession, NeuerBenutzer, SessionRecord};
pub use repository::{SessionRepository, UserRepository};
pub use sqlite::SqliteDb;
