//! Ausgabe und Validierung von Session-Tokens
//!
//! Tokens sind 32 zufaellige Byte (URL-sicheres Base64, 256 Bit Entropie)
//! aus dem Betriebssystem-CSPRNG. Der massgebliche Session-Zustand
//! (Ablauf, Widerruf, Benutzerbindung) liegt in der Datenbank; ein
//! vorgelegter Token ohne passenden Datensatz wird immer abgelehnt.
//!
//! Ablauf wird lazy beim Validieren gegen `expires_at` geprueft; Sessions
//! werden nicht aktiv zum Ablauf gedraengt.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

use pfoertner_db::{NeueSession, SessionRecord, SessionRepository};

use crate::error::{AuthError, AuthResult};

/// Standard-Session-Lebensdauer in Stunden
pub const STANDARD_LEBENSDAUER_STUNDEN: i64 = 24;

/// Stellt Session-Tokens aus und validiert sie
pub struct TokenIssuer<S: SessionRepository> {
    sessions: Arc<S>,
    lebensdauer: Duration,
}

impl<S: SessionRepository> TokenIssuer<S> {
    /// Erstellt einen TokenIssuer mit der angegebenen Session-Lebensdauer
    pub fn neu(sessions: Arc<S>, lebensdauer: Duration) -> Self {
        Self {
            sessions,
            lebensdauer,
        }
    }

    /// Erstellt einen TokenIssuer mit der Standard-Lebensdauer (24 Stunden)
    pub fn mit_standard_lebensdauer(sessions: Arc<S>) -> Self {
        Self::neu(sessions, Duration::hours(STANDARD_LEBENSDAUER_STUNDEN))
    }

    /// Stellt eine neue Session fuer den Benutzer aus
    ///
    /// Eine Token-Kollision beim Einfuegen bedeutet eine fehlerhafte
    /// Entropiequelle und ist fatal; es wird nicht erneut gewuerfelt.
    pub async fn ausstellen(&self, user_id: Uuid) -> AuthResult<SessionRecord> {
        let token = token_generieren();
        let jetzt = Utc::now();

        let session = self
            .sessions
            .insert(NeueSession {
                token: &token,
                user_id,
                issued_at: jetzt,
                expires_at: jetzt + self.lebensdauer,
            })
            .await
            .map_err(|e| {
                if e.ist_eindeutigkeit() {
                    AuthError::TokenKollision
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::debug!(user_id = %user_id, "Neue Session ausgestellt");
        Ok(session)
    }

    /// Validiert einen Token und gibt die Session zurueck
    ///
    /// Schlaegt geschlossen fehl: unbekannte, abgelaufene und widerrufene
    /// Tokens liefern alle `AuthError::SessionUngueltig` und sind fuer den
    /// Aufrufer nicht unterscheidbar.
    pub async fn validieren(&self, token: &str) -> AuthResult<SessionRecord> {
        let session = self
            .sessions
            .get_by_token(token)
            .await?
            .ok_or(AuthError::SessionUngueltig)?;

        if !session.ist_gueltig(Utc::now()) {
            return Err(AuthError::SessionUngueltig);
        }

        Ok(session)
    }

    /// Widerruft einen Token
    ///
    /// Idempotent: unbekannte oder bereits widerrufene Tokens sind No-Ops.
    pub async fn widerrufen(&self, token: &str) -> AuthResult<()> {
        self.sessions.revoke(token).await?;
        tracing::debug!("Session widerrufen");
        Ok(())
    }
}

/// Generiert einen kryptografisch sicheren Session-Token (URL-sicheres Base64)
fn token_generieren() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}
