//! `NoteStore` over the `notes`, `tags` and `note_tags` tables.

use super::{note_exists_in, parse_note_id, SqliteZettelStore};
use crate::db::{with_savepoint, FOLD_FUNCTION};
use crate::model::note::{
    now_epoch_ms, EffectiveFilter, Note, NoteDraft, NoteFilter, NoteId, NotePatch,
};
use crate::repo::{NoteStore, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    created_at,
    updated_at
FROM notes";

impl NoteStore for SqliteZettelStore<'_> {
    fn create_note(&mut self, draft: &NoteDraft) -> RepoResult<Note> {
        let tags = draft.validate()?;
        let conn = self.conn;

        with_savepoint(conn, "note_create", || {
            if find_id_by_title(conn, &draft.title)?.is_some() {
                return Err(RepoError::TitleConflict(draft.title.clone()));
            }

            let id = Uuid::new_v4();
            let now = now_epoch_ms();
            conn.execute(
                "INSERT INTO notes (id, title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4);",
                params![id.to_string(), draft.title, draft.content, now],
            )?;
            replace_tags(conn, id, &tags)?;

            Ok(Note {
                id,
                title: draft.title.clone(),
                content: draft.content.clone(),
                tags,
                created_at: now,
                updated_at: now,
            })
        })
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        load_note(self.conn, id)
    }

    fn note_exists(&self, id: NoteId) -> RepoResult<bool> {
        note_exists_in(self.conn, id)
    }

    fn find_note_id_by_title(&self, title: &str) -> RepoResult<Option<NoteId>> {
        find_id_by_title(self.conn, title)
    }

    fn update_note(&mut self, id: NoteId, patch: &NotePatch) -> RepoResult<Note> {
        let tags = patch.validate()?;
        let conn = self.conn;

        with_savepoint(conn, "note_update", || {
            let mut note = load_note(conn, id)?.ok_or(RepoError::NotFound(id))?;

            if let Some(title) = patch.title.as_ref() {
                if let Some(owner) = find_id_by_title(conn, title)? {
                    if owner != id {
                        return Err(RepoError::TitleConflict(title.clone()));
                    }
                }
                note.title = title.clone();
            }
            if let Some(content) = patch.content.as_ref() {
                note.content = content.clone();
            }
            note.updated_at = now_epoch_ms().max(note.updated_at);

            conn.execute(
                "UPDATE notes
                 SET
                    title = ?2,
                    content = ?3,
                    updated_at = ?4
                 WHERE id = ?1;",
                params![id.to_string(), note.title, note.content, note.updated_at],
            )?;

            if let Some(tags) = tags {
                replace_tags(conn, id, &tags)?;
                note.tags = tags;
            }

            Ok(note)
        })
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<()> {
        let conn = self.conn;
        let id_text = id.to_string();

        with_savepoint(conn, "note_delete", || {
            if !note_exists_in(conn, id)? {
                return Err(RepoError::NotFound(id));
            }
            let edges = conn.execute(
                "DELETE FROM links WHERE source_id = ?1 OR target_id = ?1;",
                [id_text.as_str()],
            )?;
            conn.execute("DELETE FROM notes WHERE id = ?1;", [id_text.as_str()])?;
            debug!(
                "event=note_delete module=repo status=ok note_id={} edges_removed={}",
                id, edges
            );
            Ok(())
        })
    }

    fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match filter.effective() {
            EffectiveFilter::All => {}
            EffectiveFilter::Tag(tag) => {
                sql.push_str(
                    " AND EXISTS (
                        SELECT 1
                        FROM note_tags nt
                        INNER JOIN tags t ON t.id = nt.tag_id
                        WHERE nt.note_id = notes.id
                          AND t.name = ? COLLATE NOCASE
                    )",
                );
                bind_values.push(Value::Text(tag));
            }
            EffectiveFilter::Keyword(keyword) => {
                sql.push_str(&format!(
                    " AND ({FOLD_FUNCTION}(title) LIKE ?1 ESCAPE '\\'
                       OR {FOLD_FUNCTION}(content) LIKE ?1 ESCAPE '\\')"
                ));
                let needle = escape_like(&keyword.to_lowercase());
                bind_values.push(Value::Text(format!("%{needle}%")));
            }
        }

        sql.push_str(" ORDER BY rowid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(self.conn, row)?);
        }
        Ok(notes)
    }

    fn resolve_titles(&self, ids: &[NoteId]) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT title FROM notes WHERE id = ?1;")?;
        let mut titles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(title) = stmt
                .query_row([id.to_string()], |row| row.get::<_, String>(0))
                .optional()?
            {
                titles.push(title);
            }
        }
        Ok(titles)
    }

    fn list_tags(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM tags ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("name")?;
            tags.push(value.to_lowercase());
        }
        Ok(tags)
    }
}

fn load_note(conn: &Connection, id: NoteId) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_note_row(conn, row)?));
    }
    Ok(None)
}

fn find_id_by_title(conn: &Connection, title: &str) -> RepoResult<Option<NoteId>> {
    let found: Option<String> = conn
        .query_row("SELECT id FROM notes WHERE title = ?1;", [title], |row| {
            row.get(0)
        })
        .optional()?;
    found
        .map(|value| parse_note_id(&value, "notes.id"))
        .transpose()
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let id = parse_note_id(&id_text, "notes.id")?;
    Ok(Note {
        id,
        title: row.get("title")?,
        content: row.get("content")?,
        tags: load_tags_for_note(conn, &id_text)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_tags_for_note(conn: &Connection, note_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.name
         FROM note_tags nt
         INNER JOIN tags t ON t.id = nt.tag_id
         WHERE nt.note_id = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([note_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

/// Replaces the full tag set of one note. Tags must already be normalized.
fn replace_tags(conn: &Connection, note_id: NoteId, tags: &[String]) -> RepoResult<()> {
    let note_id = note_id.to_string();
    conn.execute(
        "DELETE FROM note_tags WHERE note_id = ?1;",
        [note_id.as_str()],
    )?;

    for tag in tags {
        conn.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
            [tag.as_str()],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO note_tags (note_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![note_id.as_str(), tag.as_str()],
        )?;
    }
    Ok(())
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
