//! AuthGateway – zentraler Einstiegspunkt fuer die Praesentationsschicht
//!
//! Orchestriert Registrierung, Login, Logout, Session-Validierung und den
//! Passwort-Reset, und besitzt die Admin-Bootstrap-Invariante: nach dem
//! Start existiert garantiert ein Admin, oder der Start schlaegt fehl.
//!
//! Klartext-Passwoerter ueberleben keinen Aufruf und werden nie geloggt.

use std::sync::Arc;

use pfoertner_db::{BenutzerRecord, NeuerBenutzer, SessionRecord, SessionRepository, UserRepository};

use crate::{
    error::{AuthError, AuthResult},
    mailer::Mailer,
    password::{passwort_hashen, passwort_verifizieren},
    rate_limit::{RateLimitPolicy, RateLimiter},
    reset::{ResetAusgang, ResetWorkflow, STANDARD_MAIL_TIMEOUT},
    token::{TokenIssuer, STANDARD_LEBENSDAUER_STUNDEN},
};

/// Extern gelieferte Bootstrap-Identitaet fuer den ersten Admin
///
/// Kommt aus der Konfiguration; es gibt bewusst keinen eingebauten
/// Standardwert.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub passwort: String,
}

/// Laufzeit-Parameter des Gateways
#[derive(Debug, Clone)]
pub struct GatewayKonfig {
    /// Session-Lebensdauer
    pub session_lebensdauer: chrono::Duration,
    /// Login-Limit (Schluessel: Benutzername)
    pub login_limit: RateLimitPolicy,
    /// Reset-Limit (Schluessel: E-Mail)
    pub reset_limit: RateLimitPolicy,
    /// Timeout fuer die Mail-Zustellung im Reset-Workflow
    pub mail_timeout: std::time::Duration,
}

impl Default for GatewayKonfig {
    fn default() -> Self {
        Self {
            session_lebensdauer: chrono::Duration::hours(STANDARD_LEBENSDAUER_STUNDEN),
            login_limit: RateLimitPolicy::login(),
            reset_limit: RateLimitPolicy::passwort_reset(),
            mail_timeout: STANDARD_MAIL_TIMEOUT,
        }
    }
}

/// Zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthGateway<U: UserRepository, S: SessionRepository, M: Mailer> {
    benutzer: Arc<U>,
    token_issuer: TokenIssuer<S>,
    anmelde_limiter: Arc<RateLimiter>,
    reset: ResetWorkflow<U, M>,
}

impl<U: UserRepository, S: SessionRepository, M: Mailer> AuthGateway<U, S, M> {
    /// Erstellt ein neues AuthGateway
    pub fn neu(
        benutzer: Arc<U>,
        sessions: Arc<S>,
        mailer: Arc<M>,
        konfig: GatewayKonfig,
    ) -> Self {
        let reset = ResetWorkflow::neu(
            Arc::clone(&benutzer),
            mailer,
            RateLimiter::neu(konfig.reset_limit),
            konfig.mail_timeout,
        );
        Self {
            benutzer,
            token_issuer: TokenIssuer::neu(sessions, konfig.session_lebensdauer),
            anmelde_limiter: RateLimiter::neu(konfig.login_limit),
            reset,
        }
    }

    /// Stellt sicher dass ein Admin existiert
    ///
    /// Idempotent: existiert bereits ein Admin, passiert nichts. Existiert
    /// keiner und ist keine Bootstrap-Identitaet konfiguriert, schlaegt der
    /// Aufruf fatal fehl – ein Auth-System ohne Administrator ist kein
    /// degradierter Betrieb, sondern eine verletzte Invariante.
    pub async fn admin_bootstrap(&self, konfig: Option<&BootstrapAdmin>) -> AuthResult<()> {
        if self.benutzer.has_admin().await? {
            tracing::debug!("Admin vorhanden, Bootstrap uebersprungen");
            return Ok(());
        }

        let Some(admin) = konfig else {
            return Err(AuthError::BootstrapFehlkonfiguration(
                "kein Admin vorhanden und keine Bootstrap-Identitaet konfiguriert".into(),
            ));
        };

        let hash = passwort_hashen(&admin.passwort)?;
        let email = admin.email.trim().to_lowercase();

        let record = self
            .benutzer
            .create(NeuerBenutzer {
                username: &admin.username,
                email: &email,
                password_hash: &hash,
                is_admin: true,
            })
            .await
            .map_err(|e| {
                if e.ist_eindeutigkeit() {
                    AuthError::BootstrapFehlkonfiguration(
                        "Bootstrap-Identitaet kollidiert mit bestehendem Benutzer".into(),
                    )
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::info!(
            user_id = %record.id,
            username = %record.username,
            "Bootstrap-Admin angelegt"
        );
        Ok(())
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Die E-Mail wird kleingeschrieben gespeichert. Kollisionen mit
    /// bestehendem Benutzernamen oder E-Mail liefern `DoppelteIdentitaet`,
    /// erzwungen durch die Eindeutigkeits-Constraints der Speicherschicht.
    pub async fn registrieren(
        &self,
        username: &str,
        email: &str,
        passwort: &str,
    ) -> AuthResult<BenutzerRecord> {
        let hash = passwort_hashen(passwort)?;
        let email = email.trim().to_lowercase();

        let record = self
            .benutzer
            .create(NeuerBenutzer {
                username,
                email: &email,
                password_hash: &hash,
                is_admin: false,
            })
            .await
            .map_err(|e| {
                if e.ist_eindeutigkeit() {
                    AuthError::DoppelteIdentitaet
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::info!(
            user_id = %record.id,
            username = %record.username,
            "Neuer Benutzer registriert"
        );
        Ok(record)
    }

    /// Meldet einen Benutzer an und stellt eine Session aus
    ///
    /// Unbekannter Benutzername, falsches Passwort und deaktiviertes Konto
    /// liefern dieselben `UngueltigeAnmeldedaten`. Jeder Versuch zaehlt im
    /// Login-Fenster; ein Erfolg leert es nicht.
    pub async fn anmelden(&self, username: &str, passwort: &str) -> AuthResult<SessionRecord> {
        if let Err(retry_after) = self.anmelde_limiter.pruefen(username) {
            tracing::warn!(username = %username, "Login rate-limitiert");
            return Err(AuthError::RateLimited { retry_after });
        }
        self.anmelde_limiter.versuch_registrieren(username);

        let benutzer = self.benutzer.get_by_username(username).await?;
        let benutzer = match benutzer {
            Some(b) if b.is_active && passwort_verifizieren(passwort, &b.password_hash) => b,
            _ => {
                tracing::warn!(username = %username, "Fehlgeschlagener Login-Versuch");
                return Err(AuthError::UngueltigeAnmeldedaten);
            }
        };

        let session = self.token_issuer.ausstellen(benutzer.id).await?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Benutzer angemeldet"
        );
        Ok(session)
    }

    /// Meldet einen Benutzer ab (idempotenter Widerruf des Tokens)
    pub async fn abmelden(&self, token: &str) -> AuthResult<()> {
        self.token_issuer.widerrufen(token).await
    }

    /// Validiert einen Session-Token und gibt den Benutzer zurueck
    ///
    /// Gueltig nur wenn die Session gueltig UND der Benutzer aktiv ist.
    /// Die Session eines deaktivierten Benutzers wird dabei widerrufen.
    pub async fn session_validieren(&self, token: &str) -> AuthResult<BenutzerRecord> {
        let session = self.token_issuer.validieren(token).await?;

        let benutzer = self
            .benutzer
            .get_by_id(session.user_id)
            .await?
            .ok_or(AuthError::SessionUngueltig)?;

        if !benutzer.is_active {
            let _ = self.token_issuer.widerrufen(token).await;
            return Err(AuthError::SessionUngueltig);
        }

        Ok(benutzer)
    }

    /// Fordert einen Passwort-Reset an (siehe `reset::ResetWorkflow`)
    pub async fn passwort_reset_anfordern(
        &self,
        username: &str,
        email: &str,
    ) -> AuthResult<ResetAusgang> {
        self.reset.anfordern(username, email).await
    }
}
