use askama::Template;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::db::models::Post;
use crate::db::posts::{self, PostFilter};
use crate::db::{follows, users};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::pagination::{Page, PageQuery};
use crate::routes::home::Html;
use crate::routes::{redirect, Layout};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FeedTemplate {
    pub layout: Layout,
    pub page: Page<Post>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(feed))
        .route("/profile/{username}/follow/", get(follow))
        .route("/profile/{username}/unfollow/", get(unfollow))
}

/// Posts by every author the viewer follows.
async fn feed(
    State(state): State<AppState>,
    user: CurrentUser,
    query: PageQuery,
) -> AppResult<Html<FeedTemplate>> {
    let page = {
        let conn = state.db.get()?;
        posts::list_page(&conn, &PostFilter::FollowedBy(user.id), query.raw())?
    };

    Ok(Html(FeedTemplate {
        layout: Layout::new("Following", Some(&user)),
        page,
    }))
}

async fn follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username).map_err(AppError::from_lookup)?;

    if follows::follow(&conn, user.id, author.id)? {
        tracing::info!("{} follows {}", user.username, author.username);
    }

    Ok(redirect(&format!("/profile/{}/", author.username)))
}

async fn unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let author = users::find_by_username(&conn, &username).map_err(AppError::from_lookup)?;

    if !follows::unfollow(&conn, user.id, author.id)? {
        return Err(AppError::NotFound);
    }
    tracing::info!("{} unfollowed {}", user.username, author.username);

    Ok(redirect(&format!("/profile/{}/", author.username)))
}
