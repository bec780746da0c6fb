//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Einzige Ausnahme: die Bootstrap-Admin-Identitaet hat
//! bewusst keinen Standardwert; fehlt sie bei leerer Datenbank, bricht
//! der Start ab.

use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ServerConfig {
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Authentifizierungs-Einstellungen
    pub auth: AuthEinstellungen,
    /// Bootstrap-Admin (optional, nur fuer die Erstinbetriebnahme)
    pub admin: Option<AdminEinstellungen>,
    /// Mail-Einstellungen
    pub mail: MailEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Journal-Modus (empfohlen fuer Dateidatenbanken)
    pub wal: bool,
    /// Intervall des Session-Aufraeumlaufs in Sekunden
    pub aufraeum_intervall_sekunden: u64,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://pfoertner.db".into(),
            max_verbindungen: 5,
            wal: true,
            aufraeum_intervall_sekunden: 3600,
        }
    }
}

/// Authentifizierungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    /// Session-Lebensdauer in Stunden
    pub session_lebensdauer_stunden: i64,
    /// Login-Limit (Schluessel: Benutzername)
    pub login_limit: LimitEinstellungen,
    /// Reset-Limit (Schluessel: E-Mail)
    pub reset_limit: LimitEinstellungen,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        Self {
            session_lebensdauer_stunden: 24,
            login_limit: LimitEinstellungen {
                max_versuche: 5,
                fenster_sekunden: 300,
            },
            reset_limit: LimitEinstellungen {
                max_versuche: 3,
                fenster_sekunden: 600,
            },
        }
    }
}

/// Ein einzelnes Rate-Limit-Fenster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitEinstellungen {
    /// Maximale Versuche innerhalb des Fensters
    pub max_versuche: u32,
    /// Fensterlaenge in Sekunden
    pub fenster_sekunden: u64,
}

/// Bootstrap-Admin-Identitaet
///
/// Kein Default: ohne explizite Konfiguration existiert dieser Abschnitt
/// nicht, und eine leere Datenbank laesst den Start fehlschlagen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminEinstellungen {
    pub username: String,
    pub email: String,
    pub passwort: String,
}

/// Mail-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailEinstellungen {
    /// Absenderadresse fuer ausgehende Mails
    pub absender: String,
    /// Timeout fuer eine einzelne Zustellung in Sekunden
    pub timeout_sekunden: u64,
}

impl Default for MailEinstellungen {
    fn default() -> Self {
        Self {
            absender: "noreply@pfoertner.local".into(),
            timeout_sekunden: 10,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.datenbank.max_verbindungen, 5);
        assert_eq!(cfg.auth.session_lebensdauer_stunden, 24);
        assert_eq!(cfg.auth.login_limit.max_versuche, 5);
        assert_eq!(cfg.auth.reset_limit.fenster_sekunden, 600);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.admin.is_none(), "kein eingebauter Standard-Admin");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [datenbank]
            url = "sqlite://test.db"
            max_verbindungen = 2

            [auth]
            session_lebensdauer_stunden = 8

            [admin]
            username = "admin"
            email = "admin@example.com"
            passwort = "geheim"
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.datenbank.url, "sqlite://test.db");
        assert_eq!(cfg.datenbank.max_verbindungen, 2);
        assert_eq!(cfg.auth.session_lebensdauer_stunden, 8);
        let admin = cfg.admin.expect("Admin-Abschnitt fehlt");
        assert_eq!(admin.username, "admin");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.auth.login_limit.max_versuche, 5);
        assert_eq!(cfg.mail.timeout_sekunden, 10);
    }

    #[test]
    fn limit_abschnitte_sind_vollstaendig_anzugeben() {
        let toml = r#"
            [auth.login_limit]
            max_versuche = 10
            fenster_sekunden = 60
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.auth.login_limit.max_versuche, 10);
        assert_eq!(cfg.auth.login_limit.fenster_sekunden, 60);
        // Das Reset-Limit bleibt beim Standard
        assert_eq!(cfg.auth.reset_limit.max_versuche, 3);
    }
}
