use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "email, password_hash, created_at, updated_at";

impl Database {
    // -- Users --

    pub fn get_user(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, email))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, email"
            ))?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }

    /// Conditional put: returns `false` (and writes nothing) when a record
    /// with this email already exists.
    pub fn create_user(&self, email: &str, password_hash: &str, created_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(email) DO NOTHING",
                (email, password_hash, created_at),
            )?;
            Ok(inserted == 1)
        })
    }

    /// Replace the hash of an existing record. Returns `false` if there is no
    /// such user.
    pub fn update_password(&self, email: &str, password_hash: &str, updated_at: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE email = ?1",
                (email, password_hash, updated_at),
            )?;
            Ok(updated == 1)
        })
    }

    pub fn delete_user(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM users WHERE email = ?1", [email])?;
            Ok(deleted == 1)
        })
    }
}

fn query_user(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
    let row = stmt.query_row([email], map_user).optional()?;
    Ok(row)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        email: row.get(0)?,
        password_hash: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}
