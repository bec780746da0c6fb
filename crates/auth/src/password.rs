//! Passwort-Hashing mit bcrypt
//!
//! bcrypt verarbeitet maximal 72 Byte Eingabe. Laengere Passwoerter werden
//! vor dem Hashen UND vor der Verifikation auf exakt 72 Byte gekuerzt.
//! Zwei Passwoerter, deren erste 72 Byte uebereinstimmen, hashen und
//! verifizieren deshalb identisch. Das ist eine dokumentierte Eigenschaft
//! des Primitivs, kein Fehler.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AuthError;

/// Maximale Eingabelaenge von bcrypt in Byte
pub const BCRYPT_MAX_BYTES: usize = 72;

/// Kuerzt ein Passwort auf die bcrypt-Maximallaenge
fn auf_bcrypt_laenge_kuerzen(passwort: &str) -> &[u8] {
    let bytes = passwort.as_bytes();
    &bytes[..bytes.len().min(BCRYPT_MAX_BYTES)]
}

/// Hasht ein Passwort mit bcrypt und einem zufaelligen Salt
///
/// Gibt den PHC-String zurueck. Zwei Aufrufe mit demselben Passwort
/// liefern wegen des Salts verschiedene Hashes.
pub fn passwort_hashen(passwort: &str) -> Result<String, AuthError> {
    hash(auf_bcrypt_laenge_kuerzen(passwort), DEFAULT_COST)
        .map_err(|e| AuthError::PasswortHashing(e.to_string()))
}

/// Verifiziert ein Passwort gegen einen gespeicherten bcrypt-Hash
///
/// Gibt `false` zurueck wenn das Passwort nicht passt ODER der Hash-String
/// fehlerhaft bzw. in einer fremden Version vorliegt. Aufrufer behandeln
/// beides einheitlich als "Anmeldedaten passen nicht".
pub fn passwort_verifizieren(passwort: &str, hash: &str) -> bool {
    verify(auf_bcrypt_laenge_kuerzen(passwort), hash).unwrap_or(false)
}
