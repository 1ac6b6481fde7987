//! Login credentials stored in the `users` table.
//!
//! Passwords are kept as Argon2id PHC strings; `login` only ever answers
//! yes or no.

use crate::error::StoreError;
use crate::model::User;
use crate::validate::validate_username;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rusqlite::{Connection, OptionalExtension};

const PHC_PREFIX: &str = "$argon2";

pub fn hash_password(plain: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "argon2 hash_password error");
            StoreError::PasswordHash(e.to_string())
        })
}

/// A stored value that does not parse as a PHC hash never verifies.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        tracing::warn!("stored password is not a valid hash");
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

pub fn login(conn: &Connection, username: &str, password: &str) -> Result<bool, StoreError> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT password FROM users WHERE username = ?",
            [username.trim()],
            |r| r.get(0),
        )
        .optional()?;
    let authenticated = stored
        .map(|h| verify_password(password, &h))
        .unwrap_or(false);
    tracing::info!(username = username.trim(), authenticated, "login attempt");
    Ok(authenticated)
}

pub fn create_user(conn: &Connection, username: &str, password: &str) -> Result<User, StoreError> {
    let username = validate_username(username)?;
    let taken: Option<i64> = conn
        .query_row(
            "SELECT id FROM users WHERE username = ?",
            [&username],
            |r| r.get(0),
        )
        .optional()?;
    if taken.is_some() {
        return Err(StoreError::DuplicateUsername(username));
    }
    let hash = hash_password(password)?;
    conn.execute(
        "INSERT INTO users(username, password, created_at)
         VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (&username, &hash),
    )?;
    let id = conn.last_insert_rowid();
    let created_at: String = conn.query_row(
        "SELECT created_at FROM users WHERE id = ?",
        [id],
        |r| r.get(0),
    )?;
    tracing::info!(id, username = %username, "user created");
    Ok(User {
        id,
        username,
        created_at,
    })
}

pub fn user_count(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
}

pub fn ensure_default_admin(
    conn: &Connection,
    username: &str,
    password: &str,
) -> Result<(), StoreError> {
    if user_count(conn)? > 0 {
        return Ok(());
    }
    create_user(conn, username, password)?;
    tracing::info!(username, "seeded default user");
    Ok(())
}

/// Older databases stored passwords as typed. Replace each with its hash.
pub fn rehash_plaintext_passwords(conn: &Connection) -> Result<usize, StoreError> {
    let mut stmt = conn.prepare("SELECT id, password FROM users")?;
    let plain = stmt
        .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|(_, p)| !p.starts_with(PHC_PREFIX))
        .collect::<Vec<_>>();

    for (id, password) in &plain {
        let hash = hash_password(password)?;
        conn.execute("UPDATE users SET password = ? WHERE id = ?", (&hash, id))?;
    }
    if !plain.is_empty() {
        tracing::warn!(count = plain.len(), "re-hashed plain-text passwords");
    }
    Ok(plain.len())
}
