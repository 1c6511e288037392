//! Administration area for users with the admin flag.
//!
//! Listings for posts, groups and comments with search and delete actions.
//! Every change clears the home page cache.

use askama::Template;
use std::convert::Infallible;

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::db::models::{Comment, Group, Post};
use crate::db::posts::PostFilter;
use crate::db::{comments, follows, groups, posts, users};
use crate::error::{AppError, AppResult};
use crate::extractors::AdminUser;
use crate::forms::{validate_group, FormErrors, GroupForm};
use crate::pagination::{last_value, query_pairs, Page};
use crate::routes::home::Html;
use crate::routes::{parse_id, redirect, Layout};
use crate::state::AppState;

/// Shown instead of a missing group.
pub const EMPTY_VALUE: &str = "-empty-";

#[derive(Debug, Default)]
pub struct AdminQuery {
    pub q: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for AdminQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_pairs(&query_pairs(&parts.uri)))
    }
}

impl AdminQuery {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            q: last_value(pairs, "q"),
            date: last_value(pairs, "date"),
            page: last_value(pairs, "page"),
        }
    }

    fn q(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or_default()
    }

    fn date(&self) -> &str {
        self.date.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Filters to carry over into page links, e.g. `&q=cat&date=2024-01-02`.
    fn filter_query(&self) -> String {
        let mut out = String::new();
        for (name, value) in [("q", self.q()), ("date", self.date())] {
            if !value.is_empty() {
                out.push_str(&format!(
                    "&{}={}",
                    name,
                    utf8_percent_encode(value, NON_ALPHANUMERIC)
                ));
            }
        }
        out
    }
}

pub struct Overview {
    pub users: i64,
    pub posts: i64,
    pub groups: i64,
    pub comments: i64,
    pub follows: i64,
}

pub struct PostRow {
    pub post: Post,
}

impl PostRow {
    pub fn in_group(&self, group_id: &i64) -> bool {
        self.post.group_id == Some(*group_id)
    }

    pub fn group_label(&self) -> &str {
        self.post.group_title.as_deref().unwrap_or(EMPTY_VALUE)
    }
}

// --- Templates ---

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    pub layout: Layout,
    pub overview: Overview,
}

#[derive(Template)]
#[template(path = "admin/posts.html")]
pub struct AdminPostsTemplate {
    pub layout: Layout,
    pub page: Page<PostRow>,
    pub groups: Vec<Group>,
    pub q: String,
    pub date: String,
    pub filter_query: String,
}

#[derive(Template)]
#[template(path = "admin/groups.html")]
pub struct AdminGroupsTemplate {
    pub layout: Layout,
    pub groups: Vec<Group>,
    pub form: GroupForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "admin/comments.html")]
pub struct AdminCommentsTemplate {
    pub layout: Layout,
    pub page: Page<Comment>,
    pub q: String,
    pub filter_query: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupChoice {
    #[serde(default)]
    pub group: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(index))
        .route("/admin/posts/", get(post_list))
        .route("/admin/posts/{post_id}/group/", post(post_set_group))
        .route("/admin/posts/{post_id}/delete/", post(post_delete))
        .route("/admin/groups/", get(group_list).post(group_create))
        .route("/admin/groups/{group_id}/delete/", post(group_delete))
        .route("/admin/comments/", get(comment_list))
        .route("/admin/comments/{comment_id}/delete/", post(comment_delete))
}

// --- Handlers ---

async fn index(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Html<AdminIndexTemplate>> {
    let conn = state.db.get()?;
    let overview = Overview {
        users: users::count(&conn)?,
        posts: posts::count(&conn, &PostFilter::All)?,
        groups: groups::count(&conn)?,
        comments: comments::count(&conn)?,
        follows: follows::count(&conn)?,
    };

    Ok(Html(AdminIndexTemplate {
        layout: Layout::new("Site administration", Some(&admin)),
        overview,
    }))
}

async fn post_list(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    query: AdminQuery,
) -> AppResult<Html<AdminPostsTemplate>> {
    let filter = PostFilter::Search {
        query: Some(query.q().to_string()),
        date: Some(query.date().to_string()),
    };

    let conn = state.db.get()?;
    let page = posts::list_page(&conn, &filter, query.page.as_deref())?;
    let groups = groups::list_all(&conn)?;

    Ok(Html(AdminPostsTemplate {
        layout: Layout::new("Posts", Some(&admin)),
        page: page.map(|post| PostRow { post }),
        groups,
        q: query.q().to_string(),
        date: query.date().to_string(),
        filter_query: query.filter_query(),
    }))
}

async fn post_set_group(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(post_id): Path<String>,
    Form(choice): Form<GroupChoice>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let group_id = match choice.group.trim() {
        "" => None,
        raw => {
            let id = raw
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest("Unknown group".into()))?;
            let conn = state.db.get()?;
            match groups::find_by_id(&conn, id) {
                Ok(group) => Some(group.id),
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(AppError::BadRequest("Unknown group".into()))
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    {
        let conn = state.db.get()?;
        if !posts::set_group(&conn, post_id, group_id)? {
            return Err(AppError::NotFound);
        }
    }
    tracing::info!("{} moved post {} to group {:?}", admin.username, post_id, group_id);
    state.clear_cache().await;

    Ok(redirect("/admin/posts/"))
}

async fn post_delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    {
        let conn = state.db.get()?;
        if !posts::delete(&conn, post_id)? {
            return Err(AppError::NotFound);
        }
    }
    tracing::info!("{} deleted post {}", admin.username, post_id);
    state.clear_cache().await;

    Ok(redirect("/admin/posts/"))
}

async fn group_list(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Html<AdminGroupsTemplate>> {
    let groups = {
        let conn = state.db.get()?;
        groups::list_all(&conn)?
    };

    Ok(Html(AdminGroupsTemplate {
        layout: Layout::new("Groups", Some(&admin)),
        groups,
        form: GroupForm::default(),
        errors: FormErrors::default(),
    }))
}

async fn group_create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Form(form): Form<GroupForm>,
) -> AppResult<Response> {
    let mut errors = validate_group(&form);
    let title = form.title.trim();
    let slug = form.slug.trim();

    {
        let conn = state.db.get()?;
        if !errors.has("slug") && groups::slug_taken(&conn, slug)? {
            errors.add("slug", "Group with this Slug already exists.");
        }

        if !errors.is_empty() {
            return Ok(Html(AdminGroupsTemplate {
                layout: Layout::new("Groups", Some(&admin)),
                groups: groups::list_all(&conn)?,
                form: form.clone(),
                errors,
            })
            .into_response());
        }

        groups::create(&conn, title, slug, form.description.trim())?;
    }
    tracing::info!("{} created group {}", admin.username, slug);
    state.clear_cache().await;

    Ok(redirect("/admin/groups/"))
}

async fn group_delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(group_id): Path<String>,
) -> AppResult<Response> {
    let group_id = parse_id(&group_id)?;
    {
        let conn = state.db.get()?;
        if !groups::delete(&conn, group_id)? {
            return Err(AppError::NotFound);
        }
    }
    tracing::info!("{} deleted group {}", admin.username, group_id);
    state.clear_cache().await;

    Ok(redirect("/admin/groups/"))
}

async fn comment_list(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    query: AdminQuery,
) -> AppResult<Html<AdminCommentsTemplate>> {
    let page = {
        let conn = state.db.get()?;
        comments::search_page(&conn, Some(query.q()), query.page.as_deref())?
    };

    Ok(Html(AdminCommentsTemplate {
        layout: Layout::new("Comments", Some(&admin)),
        page,
        q: query.q().to_string(),
        filter_query: query.filter_query(),
    }))
}

async fn comment_delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(comment_id): Path<String>,
) -> AppResult<Response> {
    let comment_id = parse_id(&comment_id)?;
    {
        let conn = state.db.get()?;
        if !comments::delete(&conn, comment_id)? {
            return Err(AppError::NotFound);
        }
    }
    tracing::info!("{} deleted comment {}", admin.username, comment_id);
    state.clear_cache().await;

    Ok(redirect("/admin/comments/"))
}
