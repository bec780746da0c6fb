//! Mail-Zustellung als austauschbare Abstraktion
//!
//! Der ResetWorkflow haengt nur vom `Mailer`-Trait ab; wie zugestellt
//! wird (SMTP, HTTP-API, ...) entscheidet die Implementierung. Aufrufe
//! werden an der Aufrufstelle mit `tokio::time::timeout` begrenzt, damit
//! ein haengender Transport keine Recovery-Anfrage offen haelt.

/// Zustell-Abstraktion fuer ausgehende Mails
#[allow(async_fn_in_trait)]
pub trait Mailer: Send + Sync {
    /// Stellt eine Nachricht zu oder gibt einen Fehler zurueck
    async fn senden(&self, an: &str, betreff: &str, text: &str) -> anyhow::Result<()>;
}

/// Entwicklungs-Mailer: loggt die Zustellung und meldet Erfolg
///
/// Loggt Empfaenger und Betreff, nie den Nachrichtentext (der kann beim
/// Passwort-Reset ein temporaeres Passwort enthalten).
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn senden(&self, an: &str, betreff: &str, _text: &str) -> anyhow::Result<()> {
        tracing::info!(an = %an, betreff = %betreff, "Mail-Zustellung (Log-Stub)");
        Ok(())
    }
}
