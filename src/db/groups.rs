use rusqlite::{params, Connection, Row};

use crate::db::models::Group;

fn map_group(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

pub fn list_all(conn: &Connection) -> rusqlite::Result<Vec<Group>> {
    let mut stmt =
        conn.prepare("SELECT id, title, slug, description FROM groups ORDER BY title, id")?;
    let groups = stmt
        .query_map([], map_group)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Group> {
    conn.query_row(
        "SELECT id, title, slug, description FROM groups WHERE slug = ?1",
        params![slug],
        map_group,
    )
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Group> {
    conn.query_row(
        "SELECT id, title, slug, description FROM groups WHERE id = ?1",
        params![id],
        map_group,
    )
}

pub fn slug_taken(conn: &Connection, slug: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM groups WHERE slug = ?1",
        params![slug],
        |row| row.get(0),
    )
}

pub fn create(
    conn: &Connection,
    title: &str,
    slug: &str,
    description: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO groups (title, slug, description) VALUES (?1, ?2, ?3)",
        params![title, slug, description],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Delete a group. Its posts stay, with the group cleared.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM groups WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM groups", [], |row| row.get(0))
}
