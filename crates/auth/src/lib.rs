//! pfoertner-auth – Authentifizierung und Zugriffskontrolle
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit bcrypt (72-Byte-Grenze, siehe `password`)
//! - Sliding-Window-Rate-Limiting gegen Brute-Force
//! - Session-Tokens mit DB-Persistenz und Widerruf
//! - Passwort-Reset-Workflow mit Mail-Zustellung und Anzeige-Fallback
//! - AuthGateway (Registrierung, Login, Logout, Session-Validierung,
//!   Admin-Bootstrap)
//!
//! Die Praesentationsschicht konsumiert ausschliesslich das `AuthGateway`;
//! sie transportiert den Session-Token (z.B. als Cookie) und haelt nie
//! den Session-Datensatz selbst.

pub mod error;
pub mod gateway;
pub mod mailer;
pub mod password;
pub mod rate_limit;
pub mod reset;
pub mod token;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use gateway::{AuthGateway, BootstrapAdmin, GatewayKonfig};
pub use mailer::{LogMailer, Mailer};
pub use password::{passwort_hashen, passwort_verifizieren};
pub use rate_limit::{RateLimitPolicy, RateLimiter};
pub use reset::{ResetAusgang, ResetWorkflow};
pub use token::TokenIssuer;
