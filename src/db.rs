use crate::auth;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "roster.sqlite3";

/// Credentials seeded into an empty `users` table.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join(DB_FILE_NAME)
}

pub fn open_db(workspace: &Path, seed: &AdminSeed) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(db_path(workspace))?;
    init_schema(&conn)?;
    auth::rehash_plaintext_passwords(&conn)?;
    auth::ensure_default_admin(&conn, &seed.username, &seed.password)?;
    tracing::info!(workspace = %workspace.display(), "workspace database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            roll TEXT UNIQUE NOT NULL,
            department TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            phone TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            updated_at TEXT
        )",
        [],
    )?;
    // Databases written by the first release have no updated_at column.
    ensure_students_updated_at(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_roll ON students(roll)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_department ON students(department)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_email ON students(email)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        )",
        [],
    )?;
    Ok(())
}

fn ensure_students_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "students", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN updated_at TEXT", [])?;
    conn.execute(
        "UPDATE students SET updated_at = created_at WHERE updated_at IS NULL",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("first");
        init_schema(&conn).expect("second");
        assert!(table_has_column(&conn, "students", "updated_at").unwrap());
        assert!(table_has_column(&conn, "users", "password").unwrap());
    }

    #[test]
    fn backfills_updated_at_on_old_tables() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute(
            "CREATE TABLE students(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                roll TEXT UNIQUE NOT NULL,
                department TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                phone TEXT,
                created_at TEXT
            )",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO students(name, roll, department, email, created_at)
             VALUES('A', 'R1', 'D', 'a@b.co', '2024-01-02T03:04:05Z')",
            [],
        )
        .unwrap();

        init_schema(&conn).expect("migrate");
        let updated: String = conn
            .query_row("SELECT updated_at FROM students WHERE roll = 'R1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(updated, "2024-01-02T03:04:05Z");
    }

    #[test]
    fn open_db_seeds_admin_once() {
        let ws = std::env::temp_dir().join(format!("rosterd-db-{}", uuid::Uuid::new_v4()));
        let seed = AdminSeed {
            username: "admin".into(),
            password: "admin123".into(),
        };
        {
            let conn = open_db(&ws, &seed).expect("open");
            assert_eq!(auth::user_count(&conn).unwrap(), 1);
        }
        let conn = open_db(&ws, &seed).expect("reopen");
        assert_eq!(auth::user_count(&conn).unwrap(), 1);
        assert!(auth::login(&conn, "admin", "admin123").unwrap());
        let _ = std::fs::remove_dir_all(&ws);
    }
}
