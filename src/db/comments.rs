use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::db::models::Comment;
use crate::db::posts::escape_like;
use crate::pagination::{paginate, Page, POSTS_PER_PAGE};

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.author_id, u.username, c.text, c.created
     FROM comments c
     JOIN users u ON u.id = c.author_id";

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        text: row.get(4)?,
        created: row.get(5)?,
    })
}

/// Comments of a post, oldest first.
pub fn list_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE c.post_id = ?1 ORDER BY c.created ASC, c.id ASC",
        COMMENT_SELECT
    ))?;
    let comments = stmt
        .query_map(params![post_id], map_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn create(conn: &Connection, post_id: i64, author_id: i64, text: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO comments (post_id, author_id, text) VALUES (?1, ?2, ?3)",
        params![post_id, author_id, text],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
}

/// Admin listing, newest first, searching comment text and author name.
pub fn search_page(
    conn: &Connection,
    query: Option<&str>,
    raw_page: Option<&str>,
) -> rusqlite::Result<Page<Comment>> {
    let (clause, values) = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let pattern = format!("%{}%", escape_like(q));
            (
                "WHERE c.text LIKE ?1 ESCAPE '\\' OR u.username LIKE ?1 ESCAPE '\\'",
                vec![Value::Text(pattern)],
            )
        }
        None => ("", Vec::new()),
    };

    let total: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM comments c JOIN users u ON u.id = c.author_id {}",
            clause
        ),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    paginate(total, raw_page, POSTS_PER_PAGE, |limit, offset| {
        let n = values.len();
        let mut stmt = conn.prepare(&format!(
            "{} {} ORDER BY c.created DESC, c.id DESC LIMIT ?{} OFFSET ?{}",
            COMMENT_SELECT,
            clause,
            n + 1,
            n + 2
        ))?;
        let mut bound = values.clone();
        bound.push(Value::Integer(limit));
        bound.push(Value::Integer(offset));
        let comments = stmt
            .query_map(params_from_iter(bound), map_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    })
}
