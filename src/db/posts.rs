use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::db::models::{full_name, Post};
use crate::pagination::{paginate, Page, POSTS_PER_PAGE};

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.author_id, u.username,
            u.first_name, u.last_name, p.group_id, g.title, g.slug, p.image
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN groups g ON g.id = p.group_id";

const ORDERING: &str = "ORDER BY p.pub_date DESC, p.id DESC";

/// Which posts a listing shows.
#[derive(Debug, Clone)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
    /// Admin listing: optional text search and optional `YYYY-MM-DD` day.
    Search {
        query: Option<String>,
        date: Option<String>,
    },
}

impl PostFilter {
    fn where_clause(&self) -> (String, Vec<Value>) {
        match self {
            PostFilter::All => (String::new(), Vec::new()),
            PostFilter::Group(id) => ("WHERE p.group_id = ?".into(), vec![Value::Integer(*id)]),
            PostFilter::Author(id) => ("WHERE p.author_id = ?".into(), vec![Value::Integer(*id)]),
            PostFilter::FollowedBy(id) => (
                "WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)".into(),
                vec![Value::Integer(*id)],
            ),
            PostFilter::Search { query, date } => {
                let mut clauses = Vec::new();
                let mut values = Vec::new();
                if let Some(q) = query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
                    clauses.push("p.text LIKE ? ESCAPE '\\'");
                    values.push(Value::Text(format!("%{}%", escape_like(q))));
                }
                if let Some(day) = date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                    clauses.push("date(p.pub_date) = ?");
                    values.push(Value::Text(day.to_string()));
                }
                if clauses.is_empty() {
                    (String::new(), values)
                } else {
                    (format!("WHERE {}", clauses.join(" AND ")), values)
                }
            }
        }
    }
}

pub struct NewPost<'a> {
    pub text: &'a str,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<&'a str>,
}

pub(crate) fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let username: String = row.get(4)?;
    let first_name: String = row.get(5)?;
    let last_name: String = row.get(6)?;
    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: row.get(2)?,
        author_id: row.get(3)?,
        author_name: full_name(&first_name, &last_name, &username),
        author_username: username,
        group_id: row.get(7)?,
        group_title: row.get(8)?,
        group_slug: row.get(9)?,
        image: row.get(10)?,
    })
}

pub fn count(conn: &Connection, filter: &PostFilter) -> rusqlite::Result<i64> {
    let (clause, values) = filter.where_clause();
    conn.query_row(
        &format!("SELECT COUNT(*) FROM posts p {}", clause),
        params_from_iter(values),
        |row| row.get(0),
    )
}

/// One page of posts, newest first.
pub fn list_page(
    conn: &Connection,
    filter: &PostFilter,
    raw_page: Option<&str>,
) -> rusqlite::Result<Page<Post>> {
    let total = count(conn, filter)?;
    paginate(total, raw_page, POSTS_PER_PAGE, |limit, offset| {
        let (clause, mut values) = filter.where_clause();
        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));
        let mut stmt = conn.prepare(&format!(
            "{} {} {} LIMIT ? OFFSET ?",
            POST_SELECT, clause, ORDERING
        ))?;
        let posts = stmt
            .query_map(params_from_iter(values), map_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    })
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Post> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", POST_SELECT),
        params![id],
        map_post,
    )
}

pub fn create(conn: &Connection, post: &NewPost<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (text, author_id, group_id, image) VALUES (?1, ?2, ?3, ?4)",
        params![post.text, post.author_id, post.group_id, post.image],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update the editable fields. Author and publication date never change.
pub fn update(
    conn: &Connection,
    id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
        params![text, group_id, image, id],
    )?;
    Ok(())
}

pub fn set_group(conn: &Connection, id: i64, group_id: Option<i64>) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE posts SET group_id = ?1 WHERE id = ?2",
        params![group_id, id],
    )?;
    Ok(rows > 0)
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}
