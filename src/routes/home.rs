use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::cache::cache_key;
use crate::db::models::Post;
use crate::db::posts::{self, PostFilter};
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::pagination::{self, Page, PageQuery};
use crate::routes::Layout;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate {
    pub layout: Layout,
    pub page: Page<Post>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => html_body(StatusCode::OK, body),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub fn html_body(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Home listing. The rendered page is cached per resolved page number and
/// viewer, so stray query strings share one entry.
pub async fn index(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    query: PageQuery,
) -> AppResult<Response> {
    let count = {
        let conn = state.db.get()?;
        posts::count(&conn, &PostFilter::All)?
    };
    let number = pagination::resolve_page(
        query.raw(),
        pagination::num_pages(count, pagination::POSTS_PER_PAGE),
    );
    let key = cache_key(&format!("/?page={}", number), maybe_user.username());

    if let Some(body) = state.page_cache.lock().await.get(&key) {
        tracing::debug!("Page cache hit: {}", key);
        return Ok(html_body(StatusCode::OK, body));
    }

    let page = {
        let conn = state.db.get()?;
        posts::list_page(&conn, &PostFilter::All, Some(&number.to_string()))?
    };

    let body = IndexTemplate {
        layout: Layout::new("Latest updates", maybe_user.0.as_ref()),
        page,
    }
    .render()?;

    tracing::debug!("Page cache miss: {}", key);
    state.page_cache.lock().await.insert(key, body.clone());

    Ok(html_body(StatusCode::OK, body))
}
