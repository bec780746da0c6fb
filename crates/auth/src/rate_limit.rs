//! Sliding-Window-Rate-Limiter gegen Brute-Force
//!
//! Zaehlt Versuche pro Identifikator (Benutzername beim Login, E-Mail beim
//! Passwort-Reset) innerhalb eines gleitenden Zeitfensters. Der Zustand
//! ist prozesslokal und fluechtig; ein Neustart leert alle Fenster.
//!
//! Ein erfolgreicher Login leert das Fenster NICHT – nur Zeitablauf tut
//! das. Es gibt deshalb bewusst keine Reset-Methode.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

/// Richtlinie fuer ein Rate-Limit-Fenster
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    /// Maximale Versuche innerhalb des Fensters
    pub max_versuche: u32,
    /// Laenge des gleitenden Fensters
    pub fenster: Duration,
}

impl RateLimitPolicy {
    pub fn neu(max_versuche: u32, fenster: Duration) -> Self {
        Self {
            max_versuche,
            fenster,
        }
    }

    /// Login-Richtlinie: 5 Versuche in 5 Minuten, Schluessel Benutzername
    pub fn login() -> Self {
        Self::neu(5, Duration::from_secs(5 * 60))
    }

    /// Reset-Richtlinie: 3 Versuche in 10 Minuten, Schluessel E-Mail
    pub fn passwort_reset() -> Self {
        Self::neu(3, Duration::from_secs(10 * 60))
    }
}

/// Versuchszeitpunkte eines einzelnen Identifikators
#[derive(Debug, Default)]
struct VersuchsFenster {
    zeitpunkte: VecDeque<Instant>,
}

impl VersuchsFenster {
    /// Entfernt Zeitpunkte die aus dem Fenster gefallen sind
    fn ausduennen(&mut self, jetzt: Instant, fenster: Duration) {
        while let Some(&aeltester) = self.zeitpunkte.front() {
            if jetzt.duration_since(aeltester) >= fenster {
                self.zeitpunkte.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Rate Limiter mit gleitendem Fenster pro Identifikator
pub struct RateLimiter {
    policy: RateLimitPolicy,
    fenster: Mutex<HashMap<String, VersuchsFenster>>,
}

impl RateLimiter {
    pub fn neu(policy: RateLimitPolicy) -> Arc<Self> {
        Arc::new(Self {
            policy,
            fenster: Mutex::new(HashMap::new()),
        })
    }

    /// Prueft ob ein weiterer Versuch erlaubt ist
    ///
    /// Gibt `Ok(())` zurueck wenn erlaubt, sonst `Err(retry_after)`:
    /// die Restzeit bis der aelteste Versuch im Fenster herausfaellt.
    pub fn pruefen(&self, identifikator: &str) -> Result<(), Duration> {
        let jetzt = Instant::now();
        let mut fenster = self.fenster.lock();

        let Some(eintrag) = fenster.get_mut(identifikator) else {
            return Ok(());
        };
        eintrag.ausduennen(jetzt, self.policy.fenster);

        if (eintrag.zeitpunkte.len() as u32) < self.policy.max_versuche {
            return Ok(());
        }

        let aeltester = *eintrag
            .zeitpunkte
            .front()
            .unwrap_or(&jetzt);
        let retry_after = self
            .policy
            .fenster
            .saturating_sub(jetzt.duration_since(aeltester));
        Err(retry_after)
    }

    /// Registriert einen Versuch fuer den Identifikator
    ///
    /// Wird bei jedem Versuch aufgerufen, unabhaengig vom Ausgang.
    pub fn versuch_registrieren(&self, identifikator: &str) {
        let jetzt = Instant::now();
        let mut fenster = self.fenster.lock();
        let eintrag = fenster
            .entry(identifikator.to_string())
            .or_default();
        eintrag.ausduennen(jetzt, self.policy.fenster);
        eintrag.zeitpunkte.push_back(jetzt);
    }

    /// Entfernt Identifikatoren ohne Versuche im Fenster (Speicher-Hygiene)
    pub fn cleanup(&self) {
        let jetzt = Instant::now();
        let fenster_dauer = self.policy.fenster;
        let mut fenster = self.fenster.lock();
        fenster.retain(|_, eintrag| {
            eintrag.ausduennen(jetzt, fenster_dauer);
            !eintrag.zeitpunkte.is_empty()
        });
    }

    /// Gibt die aktive Richtlinie zurueck
    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, fenster_sekunden: u64) -> Arc<RateLimiter> {
        RateLimiter::neu(RateLimitPolicy::neu(
            max,
            Duration::from_secs(fenster_sekunden),
        ))
    }

    /// Datiert alle Versuche eines Identifikators in die Vergangenheit zurueck
    fn zurueckdatieren(limiter: &RateLimiter, id: &str, um: Duration) {
        let mut fenster = limiter.fenster.lock();
        let eintrag = fenster.get_mut(id).expect("Identifikator fehlt");
        for z in eintrag.zeitpunkte.iter_mut() {
            *z -= um;
        }
    }

    #[test]
    fn erlaubt_bis_zum_limit() {
        let limiter = limiter(5, 300);
        for _ in 0..5 {
            assert!(limiter.pruefen("alice").is_ok());
            limiter.versuch_registrieren("alice");
        }
        let err = limiter.pruefen("alice").expect_err("6. Versuch muss abgelehnt werden");
        assert!(err > Duration::ZERO, "retry_after muss positiv sein");
    }

    #[test]
    fn unbekannter_identifikator_ist_erlaubt() {
        let limiter = limiter(1, 300);
        assert!(limiter.pruefen("niemand").is_ok());
    }

    #[test]
    fn verschiedene_identifikatoren_unabhaengig() {
        let limiter = limiter(1, 300);
        limiter.versuch_registrieren("alice");
        assert!(limiter.pruefen("alice").is_err());
        assert!(limiter.pruefen("bob").is_ok());
    }

    #[test]
    fn fenster_ablauf_gibt_versuche_frei() {
        let limiter = limiter(5, 300);
        for _ in 0..5 {
            limiter.versuch_registrieren("alice");
        }
        assert!(limiter.pruefen("alice").is_err());

        // Alle Versuche aus dem Fenster schieben
        zurueckdatieren(&limiter, "alice", Duration::from_secs(301));
        assert!(limiter.pruefen("alice").is_ok());
    }

    #[test]
    fn retry_after_entspricht_aeltestem_versuch() {
        let limiter = limiter(1, 300);
        limiter.versuch_registrieren("alice");
        // Versuch ist 100s alt -> noch ~200s Sperre
        zurueckdatieren(&limiter, "alice", Duration::from_secs(100));

        let retry_after = limiter.pruefen("alice").unwrap_err();
        assert!(retry_after <= Duration::from_secs(200));
        assert!(retry_after > Duration::from_secs(195));
    }

    #[test]
    fn teilweiser_ablauf_gibt_nur_frei_was_herausfaellt() {
        let limiter = limiter(2, 300);
        limiter.versuch_registrieren("alice");
        limiter.versuch_registrieren("alice");
        assert!(limiter.pruefen("alice").is_err());

        // Nur den aeltesten Versuch herausfallen lassen: beide um 301s
        // zurueck, dann einen frischen registrieren
        zurueckdatieren(&limiter, "alice", Duration::from_secs(301));
        assert!(limiter.pruefen("alice").is_ok());
        limiter.versuch_registrieren("alice");
        assert!(limiter.pruefen("alice").is_ok());
        limiter.versuch_registrieren("alice");
        assert!(limiter.pruefen("alice").is_err());
    }

    #[test]
    fn cleanup_entfernt_leere_fenster() {
        let limiter = limiter(5, 300);
        limiter.versuch_registrieren("alice");
        limiter.versuch_registrieren("bob");
        zurueckdatieren(&limiter, "alice", Duration::from_secs(301));

        limiter.cleanup();

        let fenster = limiter.fenster.lock();
        assert!(!fenster.contains_key("alice"));
        assert!(fenster.contains_key("bob"));
    }

    #[test]
    fn standard_richtlinien() {
        let login = RateLimitPolicy::login();
        assert_eq!(login.max_versuche, 5);
        assert_eq!(login.fenster, Duration::from_secs(300));

        let reset = RateLimitPolicy::passwort_reset();
        assert_eq!(reset.max_versuche, 3);
        assert_eq!(reset.fenster, Duration::from_secs(600));
    }
}
