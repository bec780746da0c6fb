//! Fehlertypen fuer das Auth-Subsystem
//!
//! Nur `BootstrapFehlkonfiguration` und `TokenKollision` sind fatal.
//! Alle anderen Varianten sind erwartbare, behandelbare Ausgaenge.
//! Keine Fehlermeldung enthaelt jemals ein Klartext-Passwort, einen
//! Passwort-Hash oder die Angabe, welches Feld nicht gepasst hat.

use std::time::Duration;

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Subsystem
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    // --- Registrierung ---
    #[error("Benutzername oder E-Mail bereits vergeben")]
    DoppelteIdentitaet,

    // --- Authentifizierung ---
    #[error("Benutzername oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    #[error("Zu viele Versuche, erneut moeglich in {} Sekunden", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    // --- Session ---
    #[error("Session nicht gefunden, abgelaufen oder widerrufen")]
    SessionUngueltig,

    #[error("Token-Kollision: Entropiequelle fehlerhaft")]
    TokenKollision,

    // --- Bootstrap ---
    #[error("Admin-Bootstrap fehlkonfiguriert: {0}")]
    BootstrapFehlkonfiguration(String),

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] pfoertner_db::DbError),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt `true` zurueck wenn der Fehler den Prozessstart abbrechen muss
    pub fn ist_fatal(&self) -> bool {
        matches!(
            self,
            Self::BootstrapFehlkonfiguration(_) | Self::TokenKollision
        )
    }
}

/// Result-Alias fuer das Auth-Subsystem
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nur_bootstrap_und_kollision_sind_fatal() {
        assert!(AuthError::BootstrapFehlkonfiguration("kein Admin".into()).ist_fatal());
        assert!(AuthError::TokenKollision.ist_fatal());
        assert!(!AuthError::UngueltigeAnmeldedaten.ist_fatal());
        assert!(!AuthError::DoppelteIdentitaet.ist_fatal());
        assert!(!AuthError::SessionUngueltig.ist_fatal());
    }

    #[test]
    fn rate_limited_meldung_enthaelt_wartezeit() {
        let err = AuthError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert!(err.to_string().contains("42"));
    }
}
