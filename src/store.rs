use crate::error::StoreError;
use crate::model::{Student, StudentDraft};
use rusqlite::{Connection, OptionalExtension, Row};

const STUDENT_COLUMNS: &str = "id, name, roll, department, email, phone, created_at, updated_at";

/// CRUD over the `students` table. Borrowed per call from the connection the
/// caller owns; it holds no state of its own.
pub struct StudentStore<'c> {
    conn: &'c Connection,
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    let created_at: Option<String> = row.get(6)?;
    let updated_at: Option<String> = row.get(7)?;
    let created_at = created_at.unwrap_or_default();
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        roll: row.get(2)?,
        department: row.get(3)?,
        email: row.get(4)?,
        phone: row
            .get::<_, Option<String>>(5)?
            .filter(|p| !p.trim().is_empty()),
        updated_at: updated_at.unwrap_or_else(|| created_at.clone()),
        created_at,
    })
}

fn roll_owner(conn: &Connection, roll: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM students WHERE roll = ?1 COLLATE NOCASE",
        [roll],
        |r| r.get(0),
    )
    .optional()
}

fn email_owner(conn: &Connection, email: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM students WHERE email = ?1 COLLATE NOCASE",
        [email],
        |r| r.get(0),
    )
    .optional()
}

/// Fails if `roll` or `email` belongs to a record other than `except`.
fn check_unique(
    conn: &Connection,
    draft: &StudentDraft,
    except: Option<i64>,
) -> Result<(), StoreError> {
    let other = |owner: Option<i64>| owner.filter(|id| Some(*id) != except);
    if other(roll_owner(conn, draft.roll())?).is_some() {
        return Err(StoreError::DuplicateRoll(draft.roll().to_string()));
    }
    if other(email_owner(conn, draft.email())?).is_some() {
        return Err(StoreError::DuplicateEmail(draft.email().to_string()));
    }
    Ok(())
}

impl<'c> StudentStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn add(&self, draft: &StudentDraft) -> Result<Student, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        check_unique(&tx, draft, None)?;
        tx.execute(
            "INSERT INTO students(name, roll, department, email, phone, created_at, updated_at)
             VALUES(?, ?, ?, ?, ?,
                    strftime('%Y-%m-%dT%H:%M:%SZ','now'),
                    strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
            (
                draft.name(),
                draft.roll(),
                draft.department(),
                draft.email(),
                draft.phone(),
            ),
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        tracing::info!(id, roll = draft.roll(), "student added");
        self.get(id)
    }

    pub fn update(&self, id: i64, draft: &StudentDraft) -> Result<Student, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let exists: Option<i64> = tx
            .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| r.get(0))
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound(id));
        }
        check_unique(&tx, draft, Some(id))?;
        tx.execute(
            "UPDATE students
             SET name = ?, roll = ?, department = ?, email = ?, phone = ?,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
             WHERE id = ?",
            (
                draft.name(),
                draft.roll(),
                draft.department(),
                draft.email(),
                draft.phone(),
                id,
            ),
        )?;
        tx.commit()?;
        tracing::info!(id, roll = draft.roll(), "student updated");
        self.get(id)
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM students WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        tracing::info!(id, "student deleted");
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Student, StoreError> {
        let sql = format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS);
        self.conn
            .query_row(&sql, [id], student_from_row)
            .optional()?
            .ok_or(StoreError::NotFound(id))
    }

    pub fn list_all(&self) -> Result<Vec<Student>, StoreError> {
        let sql = format!("SELECT {} FROM students ORDER BY id", STUDENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Case-insensitive substring match over name, roll, department and email.
    /// A blank term matches everything.
    pub fn search(&self, term: &str) -> Result<Vec<Student>, StoreError> {
        let needle = term.trim().to_lowercase();
        let all = self.list_all()?;
        if needle.is_empty() {
            return Ok(all);
        }
        Ok(all
            .into_iter()
            .filter(|s| {
                [&s.name, &s.roll, &s.department, &s.email]
                    .iter()
                    .any(|f| f.to_lowercase().contains(&needle))
            })
            .collect())
    }

    pub fn departments(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT department FROM students ORDER BY department")?;
        let rows = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_by_department(&self, department: &str) -> Result<Vec<Student>, StoreError> {
        let sql = format!(
            "SELECT {} FROM students WHERE department = ? ORDER BY name, id",
            STUDENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([department], student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))?)
    }

    pub fn count_by_department(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT department, COUNT(*) FROM students GROUP BY department ORDER BY department",
        )?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
