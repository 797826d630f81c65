use crate::Database;
use crate::models::{CommentRow, DeletedGram, GramRow, PictureRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Row};

/// Gram IDs bound per comment query.
const COMMENT_BATCH_SIZE: usize = 500;

const GRAM_COLUMNS: &str =
    "g.id, g.user_id, u.username, g.message, g.picture_id, g.created_at, g.updated_at";

impl Database {
    // -- Users --

    /// Returns false when the username is already taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            );
            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Pictures --

    pub fn insert_picture(
        &self,
        id: &str,
        uploader_id: &str,
        content_type: &str,
        size: i64,
        sha256: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO pictures (id, uploader_id, content_type, size, sha256) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, uploader_id, content_type, size, sha256],
            )?;
            Ok(())
        })
    }

    pub fn get_picture(&self, id: &str) -> Result<Option<PictureRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, uploader_id, content_type, size, sha256, created_at FROM pictures WHERE id = ?1",
                [id],
                |row| {
                    Ok(PictureRow {
                        id: row.get(0)?,
                        uploader_id: row.get(1)?,
                        content_type: row.get(2)?,
                        size: row.get(3)?,
                        sha256: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()
        })
    }

    // -- Grams --

    pub fn insert_gram(&self, id: &str, user_id: &str, message: &str, picture_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO grams (id, user_id, message, picture_id) VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, message, picture_id),
            )?;
            Ok(())
        })
    }

    pub fn get_gram(&self, id: &str) -> Result<Option<GramRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {GRAM_COLUMNS} FROM grams g JOIN users u ON g.user_id = u.id WHERE g.id = ?1"
            );
            conn.query_row(&sql, [id], gram_from_row).optional()
        })
    }

    /// Every gram, oldest first.
    pub fn list_grams(&self) -> Result<Vec<GramRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {GRAM_COLUMNS} FROM grams g JOIN users u ON g.user_id = u.id ORDER BY g.rowid"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], gram_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_grams(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM grams", [], |r| r.get(0))?))
    }

    /// Overwrites message and picture. Returns false if the gram is gone.
    pub fn update_gram(&self, id: &str, message: &str, picture_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE grams SET message = ?2, picture_id = ?3, updated_at = datetime('now') WHERE id = ?1",
                (id, message, picture_id),
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes a gram together with its comments, in one transaction.
    /// The picture row is dropped as well once no gram references it.
    /// Returns None if the gram does not exist.
    pub fn delete_gram(&self, id: &str) -> Result<Option<DeletedGram>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let picture_id: Option<String> = tx
                .query_row("SELECT picture_id FROM grams WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;
            let Some(picture_id) = picture_id else {
                return Ok(None);
            };

            let comments_removed = tx.execute("DELETE FROM comments WHERE gram_id = ?1", [id])?;
            tx.execute("DELETE FROM grams WHERE id = ?1", [id])?;
            let picture_released = tx.execute(
                "DELETE FROM pictures WHERE id = ?1
                 AND NOT EXISTS (SELECT 1 FROM grams WHERE picture_id = ?1)",
                [&picture_id],
            )? > 0;

            tx.commit()?;

            Ok(Some(DeletedGram {
                picture_id,
                comments_removed,
                picture_released,
            }))
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, id: &str, gram_id: &str, message: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, gram_id, message) VALUES (?1, ?2, ?3)",
                (id, gram_id, message),
            )?;
            Ok(())
        })
    }

    /// Batch-fetch comments for a set of gram IDs. Each gram's comments come
    /// back oldest first; the IDs are bound in chunks so any number of grams
    /// stays under SQLite's bound-variable limit.
    pub fn get_comments_for_grams(&self, gram_ids: &[String]) -> Result<Vec<CommentRow>> {
        if gram_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let mut rows = Vec::new();
            for chunk in gram_ids.chunks(COMMENT_BATCH_SIZE) {
                let placeholders: Vec<String> = (1..=chunk.len()).map(|i| format!("?{}", i)).collect();
                let sql = format!(
                    "SELECT id, gram_id, message, created_at FROM comments
                     WHERE gram_id IN ({})
                     ORDER BY created_at, rowid",
                    placeholders.join(", ")
                );

                let mut stmt = conn.prepare(&sql)?;
                let params: Vec<&dyn rusqlite::types::ToSql> = chunk
                    .iter()
                    .map(|id| id as &dyn rusqlite::types::ToSql)
                    .collect();

                let batch = stmt
                    .query_map(params.as_slice(), |row| {
                        Ok(CommentRow {
                            id: row.get(0)?,
                            gram_id: row.get(1)?,
                            message: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows.extend(batch);
            }

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            created_at: row.get(3)?,
        })
    })
    .optional()
}

fn gram_from_row(row: &Row<'_>) -> rusqlite::Result<GramRow> {
    Ok(GramRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        message: row.get(3)?,
        picture_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
