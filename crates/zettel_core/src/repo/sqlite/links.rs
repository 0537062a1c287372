//! `LinkGraph` over the `links` table.
//!
//! Backlink lookups use `idx_links_target_id`; forward lookups use the
//! `(source_id, target_id)` primary key.

use super::{note_exists_in, parse_note_id, SqliteZettelStore};
use crate::model::note::NoteId;
use crate::repo::{LinkGraph, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection};

impl LinkGraph for SqliteZettelStore<'_> {
    fn add_edge(&mut self, source: NoteId, target: NoteId) -> RepoResult<bool> {
        if source == target {
            return Err(RepoError::SelfLink(source));
        }
        for endpoint in [source, target] {
            if !note_exists_in(self.conn, endpoint)? {
                return Err(RepoError::NotFound(endpoint));
            }
        }

        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO links (source_id, target_id) VALUES (?1, ?2);",
            params![source.to_string(), target.to_string()],
        )?;
        debug!(
            "event=link_add module=repo status=ok source_id={} target_id={} created={}",
            source,
            target,
            inserted == 1
        );
        Ok(inserted == 1)
    }

    fn has_edge(&self, source: NoteId, target: NoteId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM links WHERE source_id = ?1 AND target_id = ?2
            );",
            params![source.to_string(), target.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn remove_note_edges(&mut self, id: NoteId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM links WHERE source_id = ?1 OR target_id = ?1;",
            [id.to_string()],
        )?;
        Ok(())
    }

    fn forward_links(&self, id: NoteId) -> RepoResult<Vec<NoteId>> {
        query_neighbours(
            self.conn,
            "SELECT target_id FROM links WHERE source_id = ?1 ORDER BY rowid ASC;",
            id,
            "links.target_id",
        )
    }

    fn backlinks(&self, id: NoteId) -> RepoResult<Vec<NoteId>> {
        query_neighbours(
            self.conn,
            "SELECT source_id FROM links WHERE target_id = ?1 ORDER BY rowid ASC;",
            id,
            "links.source_id",
        )
    }

    fn adjacency(&self) -> RepoResult<Vec<(NoteId, Vec<NoteId>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.source_id, l.target_id
             FROM links l
             INNER JOIN notes n ON n.id = l.source_id
             ORDER BY n.rowid ASC, l.rowid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut adjacency: Vec<(NoteId, Vec<NoteId>)> = Vec::new();
        while let Some(row) = rows.next()? {
            let source = parse_note_id(&row.get::<_, String>(0)?, "links.source_id")?;
            let target = parse_note_id(&row.get::<_, String>(1)?, "links.target_id")?;
            match adjacency.last_mut() {
                Some((current, targets)) if *current == source => targets.push(target),
                _ => adjacency.push((source, vec![target])),
            }
        }
        Ok(adjacency)
    }
}

fn query_neighbours(
    conn: &Connection,
    sql: &str,
    id: NoteId,
    column: &str,
) -> RepoResult<Vec<NoteId>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_note_id(&value, column)?);
    }
    Ok(ids)
}
