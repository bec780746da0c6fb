//! SQLite-Implementierung des UserRepository

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{BenutzerRecord, NeuerBenutzer};
use crate::repository::UserRepository;
use crate::sqlite::pool::SqliteDb;

impl UserRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO benutzer (id, username, email, password_hash, is_active, is_admin, created_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(id.to_string())
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.is_admin as i64)
        .bind(now.to_rfc3339())
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

        Ok(BenutzerRecord {
            id,
            username: data.username.to_string(),
            email: data.email.to_string(),
            password_hash: data.password_hash.to_string(),
            is_active: true,
            is_admin: data.is_admin,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_active, is_admin, created_at
             FROM benutzer WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_username(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_active, is_admin, created_at
             FROM benutzer WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_active, is_admin, created_at
             FROM benutzer WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DbResult<()> {
        let affected = sqlx::query("UPDATE benutzer SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
        }
        Ok(())
    }

    async fn set_active(&self, id: Uuid, aktiv: bool) -> DbResult<()> {
        let affected = sqlx::query("UPDATE benutzer SET is_active = ? WHERE id = ?")
            .bind(aktiv as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("Benutzer {id}")));
        }
        Ok(())
    }

    async fn has_admin(&self) -> DbResult<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS anzahl FROM benutzer WHERE is_admin = 1")
            .fetch_one(&self.pool)
            .await?;
        let anzahl: i64 = row.try_get("anzahl")?;
        Ok(anzahl > 0)
    }
}

/// Konvertiert eine Datenbankzeile in einen BenutzerRecord
fn row_to_benutzer(row: &SqliteRow) -> DbResult<BenutzerRecord> {
    let id_str: String = row.try_get("id")?;
    let created_str: String = row.try_get("created_at")?;

    Ok(BenutzerRecord {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| DbError::intern(format!("Ungueltige Benutzer-ID: {e}")))?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
        is_admin: row.try_get::<i64, _>("is_admin")? != 0,
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map_err(|e| DbError::intern(format!("Ungueltiger Zeitstempel: {e}")))?
            .with_timezone(&Utc),
    })
}
