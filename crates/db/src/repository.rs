//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt die Auth-Logik von der konkreten
//! Datenbank-Implementierung. `crates/auth` ist generisch ueber diese
//! Traits; Tests verwenden kleine In-Memory-Implementierungen.

use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{BenutzerRecord, NeueSession, NeuerBenutzer, SessionRecord};

/// Repository fuer Benutzer-Datenzugriffe
///
/// `create` muss Eindeutigkeit von Benutzername und E-Mail atomar in der
/// Speicherschicht erzwingen und bei Verletzung `DbError::Eindeutigkeit`
/// liefern (bzw. einen Fehler mit `ist_eindeutigkeit() == true`).
#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    /// Einen neuen Benutzer anlegen
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Einen Benutzer anhand seiner ID laden
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<BenutzerRecord>>;

    /// Einen Benutzer anhand seines Namens laden (case-sensitiv)
    async fn get_by_username(&self, username: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Einen Benutzer anhand der (kleingeschriebenen) E-Mail laden
    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Rotiert den Passwort-Hash eines Benutzers (einzelnes atomares UPDATE)
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()>;

    /// Aktiviert oder deaktiviert einen Benutzer
    async fn set_active(&self, id: Uuid, aktiv: bool) -> DbResult<()>;

    /// Gibt `true` zurueck wenn mindestens ein Admin existiert
    async fn has_admin(&self) -> DbResult<bool>;
}

/// Repository fuer Session-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait SessionRepository: Send + Sync {
    /// Eine neue Session einfuegen
    ///
    /// Ein bereits vorhandener Token ist eine Eindeutigkeitsverletzung.
    async fn insert(&self, data: NeueSession<'_>) -> DbResult<SessionRecord>;

    /// Eine Session anhand des Tokens laden
    async fn get_by_token(&self, token: &str) -> DbResult<Option<SessionRecord>>;

    /// Markiert eine Session als widerrufen
    ///
    /// Unbekannte oder bereits widerrufene Tokens sind kein Fehler.
    async fn revoke(&self, token: &str) -> DbResult<()>;

    /// Entfernt abgelaufene und widerrufene Sessions, gibt die Anzahl zurueck
    async fn delete_expired(&self) -> DbResult<u64>;
}
