//! Passwort-Reset-Workflow
//!
//! Ablauf pro Anfrage: Angefordert -> Verifiziert -> Ausgestellt ->
//! Benachrichtigt | BenachrichtigungFehlgeschlagen.
//!
//! Verifiziert wird nur, wenn Benutzername UND E-Mail exakt zu demselben
//! aktiven Benutzer passen (Benutzername case-sensitiv, E-Mail
//! kleingeschrieben verglichen). Bei jedem Mismatch kommt derselbe
//! generische Ausgang zurueck, ohne Angabe des fehlerhaften Feldes.
//!
//! Schlaegt die Mail-Zustellung fehl oder laeuft sie in den Timeout, wird
//! das temporaere Passwort stattdessen dem Anfragenden direkt
//! zurueckgegeben: wer Verifiziert bestanden hat, ist der legitime
//! Kontoinhaber, und Verfuegbarkeit wiegt hier schwerer als der kleine
//! Vertraulichkeitsverlust einer Bildschirmanzeige.

use std::{sync::Arc, time::Duration};

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

use pfoertner_db::UserRepository;

use crate::{
    error::{AuthError, AuthResult},
    mailer::Mailer,
    password::passwort_hashen,
    rate_limit::RateLimiter,
};

/// Laenge des temporaeren Passworts (Buchstaben + Ziffern)
const TEMP_PASSWORT_LAENGE: usize = 8;

/// Standard-Timeout fuer die Mail-Zustellung
pub const STANDARD_MAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Terminaler Ausgang einer Reset-Anfrage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetAusgang {
    /// Temporaeres Passwort wurde per Mail zugestellt
    Benachrichtigt,
    /// Zustellung fehlgeschlagen; das temporaere Passwort wird dem
    /// Anfragenden einmalig direkt angezeigt
    BenachrichtigungFehlgeschlagen { temporaeres_passwort: String },
    /// Benutzername und E-Mail passen nicht zusammen ("Angaben pruefen");
    /// verraet nicht, welches Feld nicht gepasst hat
    AngabenUnstimmig,
}

/// Orchestriert Identitaetspruefung, Passwort-Rotation und Benachrichtigung
pub struct ResetWorkflow<U: UserRepository, M: Mailer> {
    benutzer: Arc<U>,
    mailer: Arc<M>,
    limiter: Arc<RateLimiter>,
    mail_timeout: Duration,
}

impl<U: UserRepository, M: Mailer> ResetWorkflow<U, M> {
    pub fn neu(
        benutzer: Arc<U>,
        mailer: Arc<M>,
        limiter: Arc<RateLimiter>,
        mail_timeout: Duration,
    ) -> Self {
        Self {
            benutzer,
            mailer,
            limiter,
            mail_timeout,
        }
    }

    /// Fordert einen Passwort-Reset an
    ///
    /// Jede Anfrage zaehlt als ein Versuch im Recovery-Fenster, auch wenn
    /// die Verifikation scheitert.
    pub async fn anfordern(&self, username: &str, email: &str) -> AuthResult<ResetAusgang> {
        let email_norm = email.trim().to_lowercase();

        if let Err(retry_after) = self.limiter.pruefen(&email_norm) {
            tracing::warn!("Reset-Anfrage rate-limitiert");
            return Err(AuthError::RateLimited { retry_after });
        }
        self.limiter.versuch_registrieren(&email_norm);

        // Verifiziert: Benutzername und E-Mail muessen zu demselben
        // aktiven Benutzer gehoeren
        let benutzer = match self.benutzer.get_by_username(username).await? {
            Some(b) if b.is_active && b.email == email_norm => b,
            _ => {
                tracing::debug!("Reset-Verifikation fehlgeschlagen");
                return Ok(ResetAusgang::AngabenUnstimmig);
            }
        };

        // Ausgestellt: Hash-Rotation als einzelnes atomares UPDATE
        let temp_passwort = temp_passwort_generieren();
        let hash = passwort_hashen(&temp_passwort)?;
        self.benutzer
            .update_password_hash(benutzer.id, &hash)
            .await?;

        tracing::info!(user_id = %benutzer.id, "Temporaeres Passwort ausgestellt");

        // Benachrichtigt: Zustellung mit Timeout; haengender Transport
        // zaehlt als Fehlschlag
        let betreff = "Ihr temporaeres Passwort";
        let text = format!(
            "Hallo {username},\n\n\
             fuer Ihr Konto wurde ein temporaeres Passwort erstellt:\n\n\
             {temp_passwort}\n\n\
             Bitte melden Sie sich damit an und aendern Sie es umgehend."
        );

        let zustellung = tokio::time::timeout(
            self.mail_timeout,
            self.mailer.senden(&benutzer.email, betreff, &text),
        )
        .await;

        match zustellung {
            Ok(Ok(())) => {
                tracing::info!(user_id = %benutzer.id, "Reset-Mail zugestellt");
                Ok(ResetAusgang::Benachrichtigt)
            }
            Ok(Err(e)) => {
                tracing::warn!(user_id = %benutzer.id, fehler = %e, "Reset-Mail fehlgeschlagen, Anzeige-Fallback");
                Ok(ResetAusgang::BenachrichtigungFehlgeschlagen {
                    temporaeres_passwort: temp_passwort,
                })
            }
            Err(_) => {
                tracing::warn!(user_id = %benutzer.id, "Reset-Mail Timeout, Anzeige-Fallback");
                Ok(ResetAusgang::BenachrichtigungFehlgeschlagen {
                    temporaeres_passwort: temp_passwort,
                })
            }
        }
    }
}

/// Generiert ein temporaeres Passwort aus dem Betriebssystem-CSPRNG
///
/// Zeichensatz Buchstaben + Ziffern (62 Zeichen): 8 Zeichen sind ~47 Bit,
/// innerhalb des Recovery-Fensters nicht durchprobierbar.
fn temp_passwort_generieren() -> String {
    (0..TEMP_PASSWORT_LAENGE)
        .map(|_| OsRng.sample(Alphanumeric) as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::passwort_verifizieren;
    use crate::rate_limit::RateLimitPolicy;
    use chrono::Utc;
    use pfoertner_db::{BenutzerRecord, DbError, DbResult, NeuerBenutzer};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Minimales In-Memory UserRepository fuer Tests
    #[derive(Default)]
    struct TestUserRepo {
        benutzer: Mutex<Vec<BenutzerRecord>>,
    }

    impl UserRepository for TestUserRepo {
        async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
            let mut benutzer = self.benutzer.lock().unwrap();
            if benutzer
                .iter()
                .any(|b| b.username == data.username || b.email == data.email)
            {
                return Err(DbError::Eindeutigkeit);
            }
            let record = BenutzerRecord {
                id: Uuid::new_v4(),
                username: data.username.to_string(),
                email: data.email.to_string(),
                password_hash: data.password_hash.to_string(),
                is_active: true,
                is_admin: data.is_admin,
                created_at: Utc::now(),
            };
            benutzer.push(record.clone());
            Ok(record)
        }

        async fn get_by_id(&self, id: Uuid) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == id)
                .cloned())
        }

        async fn get_by_username(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.username == username)
                .cloned())
        }

        async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.email == email)
                .cloned())
        }

        async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
            let mut benutzer = self.benutzer.lock().unwrap();
            let b = benutzer
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| DbError::nicht_gefunden(id.to_string()))?;
            b.password_hash = password_hash.to_string();
            Ok(())
        }

        async fn set_active(&self, id: Uuid, aktiv: bool) -> DbResult<()> {
            let mut benutzer = self.benutzer.lock().unwrap();
            let b = benutzer
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| DbError::nicht_gefunden(id.to_string()))?;
            b.is_active = aktiv;
            Ok(())
        }

        async fn has_admin(&self) -> DbResult<bool> {
            Ok(self.benutzer.lock().unwrap().iter().any(|b| b.is_admin))
        }
    }

    /// Mailer der immer fehlschlaegt
    struct FehlschlagMailer;

    impl Mailer for FehlschlagMailer {
        async fn senden(&self, _an: &str, _betreff: &str, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("Transport nicht erreichbar")
        }
    }

    /// Mailer der haengt (fuer Timeout-Tests)
    struct HaengenderMailer;

    impl Mailer for HaengenderMailer {
        async fn senden(&self, _an: &str, _betreff: &str, _text: &str) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    async fn repo_mit_alice() -> Arc<TestUserRepo> {
        let repo = Arc::new(TestUserRepo::default());
        repo.create(NeuerBenutzer {
            username: "alice",
            email: "alice@example.com",
            password_hash: &passwort_hashen("altes_passwort").unwrap(),
            is_admin: false,
        })
        .await
        .unwrap();
        repo
    }

    fn workflow<M: Mailer>(
        repo: Arc<TestUserRepo>,
        mailer: M,
    ) -> ResetWorkflow<TestUserRepo, M> {
        ResetWorkflow::neu(
            repo,
            Arc::new(mailer),
            RateLimiter::neu(RateLimitPolicy::passwort_reset()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn erfolgreiche_zustellung() {
        let repo = repo_mit_alice().await;
        let workflow = workflow(Arc::clone(&repo), crate::mailer::LogMailer);

        let ausgang = workflow
            .anfordern("alice", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(ausgang, ResetAusgang::Benachrichtigt);

        // Altes Passwort ist rotiert
        let alice = repo.get_by_username("alice").await.unwrap().unwrap();
        assert!(!passwort_verifizieren("altes_passwort", &alice.password_hash));
    }

    #[tokio::test]
    async fn zustellung_fehlgeschlagen_liefert_temporaeres_passwort() {
        let repo = repo_mit_alice().await;
        let workflow = workflow(Arc::clone(&repo), FehlschlagMailer);

        let ausgang = workflow
            .anfordern("alice", "alice@example.com")
            .await
            .unwrap();

        let ResetAusgang::BenachrichtigungFehlgeschlagen { temporaeres_passwort } = ausgang
        else {
            panic!("erwartet Anzeige-Fallback, war {ausgang:?}");
        };

        assert_eq!(temporaeres_passwort.len(), 8);
        assert!(temporaeres_passwort.chars().all(|c| c.is_ascii_alphanumeric()));

        // Das angezeigte Passwort passt zum rotierten Hash
        let alice = repo.get_by_username("alice").await.unwrap().unwrap();
        assert!(passwort_verifizieren(&temporaeres_passwort, &alice.password_hash));
    }

    #[tokio::test(start_paused = true)]
    async fn haengender_transport_laeuft_in_den_timeout() {
        let repo = repo_mit_alice().await;
        let workflow = workflow(Arc::clone(&repo), HaengenderMailer);

        let ausgang = workflow
            .anfordern("alice", "alice@example.com")
            .await
            .unwrap();
        assert!(matches!(
            ausgang,
            ResetAusgang::BenachrichtigungFehlgeschlagen { .. }
        ));
    }

    #[tokio::test]
    async fn mismatch_liefert_denselben_generischen_ausgang() {
        let repo = repo_mit_alice().await;
        let workflow = workflow(Arc::clone(&repo), crate::mailer::LogMailer);

        // Falsche E-Mail bzw. falscher Benutzername: identischer Ausgang,
        // keine Unterscheidung welches Feld nicht passte
        let falsche_mail = workflow
            .anfordern("alice", "wrong@example.com")
            .await
            .unwrap();
        let falscher_name = workflow
            .anfordern("wrong_user", "alice@example.com")
            .await
            .unwrap();

        assert_eq!(falsche_mail, ResetAusgang::AngabenUnstimmig);
        assert_eq!(falsche_mail, falscher_name);

        // Passwort blieb unangetastet
        let alice = repo.get_by_username("alice").await.unwrap().unwrap();
        assert!(passwort_verifizieren("altes_passwort", &alice.password_hash));
    }

    #[tokio::test]
    async fn email_vergleich_ist_case_insensitiv() {
        let repo = repo_mit_alice().await;
        let workflow = workflow(Arc::clone(&repo), crate::mailer::LogMailer);

        let ausgang = workflow
            .anfordern("alice", "ALICE@Example.COM")
            .await
            .unwrap();
        assert_eq!(ausgang, ResetAusgang::Benachrichtigt);
    }

    #[tokio::test]
    async fn deaktivierter_benutzer_kann_nicht_zuruecksetzen() {
        let repo = repo_mit_alice().await;
        let alice = repo.get_by_username("alice").await.unwrap().unwrap();
        repo.set_active(alice.id, false).await.unwrap();

        let workflow = workflow(Arc::clone(&repo), crate::mailer::LogMailer);
        let ausgang = workflow
            .anfordern("alice", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(ausgang, ResetAusgang::AngabenUnstimmig);
    }

    #[tokio::test]
    async fn recovery_fenster_begrenzt_anfragen() {
        let repo = repo_mit_alice().await;
        let workflow = workflow(Arc::clone(&repo), crate::mailer::LogMailer);

        // 3 Versuche erlaubt, auch gescheiterte Verifikationen zaehlen
        for _ in 0..3 {
            workflow
                .anfordern("alice", "wrong@example.com")
                .await
                .unwrap();
        }

        let err = workflow
            .anfordern("alice", "wrong@example.com")
            .await
            .expect_err("4. Anfrage muss rate-limitiert sein");
        assert!(matches!(err, AuthError::RateLimited { retry_after } if retry_after > Duration::ZERO));
    }

    #[test]
    fn temporaeres_passwort_format() {
        let p1 = temp_passwort_generieren();
        let p2 = temp_passwort_generieren();
        assert_eq!(p1.len(), TEMP_PASSWORT_LAENGE);
        assert!(p1.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(p1, p2, "zwei Passwoerter duerfen praktisch nie gleich sein");
    }
}
