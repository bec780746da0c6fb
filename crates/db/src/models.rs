//! Datenbankmodelle fuer Pfoertner
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind reine Datenuebertragungsobjekte ohne Geschaeftslogik.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
///
/// `email` ist kleingeschrieben gespeichert. `password_hash` ist der
/// bcrypt-PHC-String und darf niemals geloggt werden. Benutzer werden nie
/// geloescht; Deaktivierung setzt nur `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Session-Datensatz aus der Datenbank
///
/// Der Aufrufer haelt nur den Token-String; der massgebliche Zustand
/// (Ablauf, Widerruf, Benutzerbindung) liegt in diesem Datensatz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl SessionRecord {
    /// Gibt `true` zurueck wenn die Session zum Zeitpunkt `jetzt` gueltig ist
    pub fn ist_gueltig(&self, jetzt: DateTime<Utc>) -> bool {
        !self.revoked && jetzt < self.expires_at
    }
}

/// Daten zum Einfuegen einer neuen Session
#[derive(Debug, Clone)]
pub struct NeueSession<'a> {
    pub token: &'a str,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
