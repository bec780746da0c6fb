//! pfoertner-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, AuthGateway und den Session-Aufraeumlauf und
//! stellt den oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};

use config::ServerConfig;
use pfoertner_auth::{
    AuthGateway, BootstrapAdmin, GatewayKonfig, LogMailer, RateLimitPolicy,
};
use pfoertner_db::{SessionRepository, SqliteDb};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen und Migrationen ausfuehren
    /// 2. AuthGateway verdrahten
    /// 3. Admin-Bootstrap (bricht bei Fehlkonfiguration den Start ab)
    /// 4. Periodischen Session-Aufraeumlauf starten
    /// 5. Auf Ctrl-C / SIGTERM warten
    pub async fn starten(self) -> Result<()> {
        let db = SqliteDb::oeffnen(
            &self.config.datenbank.url,
            self.config.datenbank.max_verbindungen,
            self.config.datenbank.wal,
        )
        .await
        .context("Datenbankverbindung fehlgeschlagen")?;
        db.migrationen_ausfuehren()
            .await
            .context("Datenbank-Migrationen fehlgeschlagen")?;
        let db = Arc::new(db);

        tracing::info!(
            url = %self.config.datenbank.url,
            "Datenbank bereit"
        );

        let gateway = AuthGateway::neu(
            Arc::clone(&db),
            Arc::clone(&db),
            Arc::new(LogMailer),
            GatewayKonfig {
                session_lebensdauer: chrono::Duration::hours(
                    self.config.auth.session_lebensdauer_stunden,
                ),
                login_limit: RateLimitPolicy::neu(
                    self.config.auth.login_limit.max_versuche,
                    Duration::from_secs(self.config.auth.login_limit.fenster_sekunden),
                ),
                reset_limit: RateLimitPolicy::neu(
                    self.config.auth.reset_limit.max_versuche,
                    Duration::from_secs(self.config.auth.reset_limit.fenster_sekunden),
                ),
                mail_timeout: Duration::from_secs(self.config.mail.timeout_sekunden),
            },
        );

        let bootstrap = self.config.admin.as_ref().map(|a| BootstrapAdmin {
            username: a.username.clone(),
            email: a.email.clone(),
            passwort: a.passwort.clone(),
        });
        gateway
            .admin_bootstrap(bootstrap.as_ref())
            .await
            .context("Admin-Bootstrap fehlgeschlagen")?;

        // Abgelaufene und widerrufene Sessions periodisch entfernen.
        // Reine Speicher-Hygiene; die Gueltigkeit haengt nicht davon ab.
        let aufraeum_db = Arc::clone(&db);
        let intervall = Duration::from_secs(self.config.datenbank.aufraeum_intervall_sekunden);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(intervall);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match aufraeum_db.delete_expired().await {
                    Ok(anzahl) if anzahl > 0 => {
                        tracing::debug!(anzahl, "Abgelaufene Sessions entfernt");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(fehler = %e, "Session-Aufraeumlauf fehlgeschlagen");
                    }
                }
            }
        });

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        Ok(())
    }
}
