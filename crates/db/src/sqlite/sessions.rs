//! SQLite-Implementierung des SessionRepository

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{NeueSession, SessionRecord};
use crate::repository::SessionRepository;
use crate::sqlite::pool::SqliteDb;

impl SessionRepository for SqliteDb {
    async fn insert(&self, data: NeueSession<'_>) -> DbResult<SessionRecord> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, issued_at, expires_at, revoked)
             VALUES (?, ?, ?, ?, 0)",
        )
        .bind(data.token)
        .bind(data.user_id.to_string())
        .bind(data.issued_at.to_rfc3339())
        .bind(data.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(SessionRecord {
            token: data.token.to_string(),
            user_id: data.user_id,
            issued_at: data.issued_at,
            expires_at: data.expires_at,
            revoked: false,
        })
    }

    async fn get_by_token(&self, token: &str) -> DbResult<Option<SessionRecord>> {
        let row = sqlx::query(
            "SELECT token, user_id, issued_at, expires_at, revoked
             FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn revoke(&self, token: &str) -> DbResult<()> {
        // Kein Fehler bei unbekanntem Token: Widerruf ist idempotent
        sqlx::query("UPDATE sessions SET revoked = 1 WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let affected = sqlx::query("DELETE FROM sessions WHERE revoked = 1 OR expires_at <= ?")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }
}

/// Konvertiert eine Datenbankzeile in einen SessionRecord
fn row_to_session(row: &SqliteRow) -> DbResult<SessionRecord> {
    let user_id_str: String = row.try_get("user_id")?;
    let issued_str: String = row.try_get("issued_at")?;
    let expires_str: String = row.try_get("expires_at")?;

    let zeit = |s: &str| -> DbResult<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(s)
            .map_err(|e| DbError::intern(format!("Ungueltiger Zeitstempel: {e}")))?
            .with_timezone(&Utc))
    };

    Ok(SessionRecord {
        token: row.try_get("token")?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| DbError::intern(format!("Ungueltige Benutzer-ID: {e}")))?,
        issued_at: zeit(&issued_str)?,
        expires_at: zeit(&expires_str)?,
        revoked: row.try_get::<i64, _>("revoked")? != 0,
    })
}
