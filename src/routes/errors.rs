use askama::Template;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::extractors::MaybeUser;
use crate::routes::home::html_body;
use crate::routes::Layout;

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
    pub path: String,
}

fn render_not_found(layout: Layout, path: String) -> Response {
    match (NotFoundTemplate { layout, path }).render() {
        Ok(body) => html_body(StatusCode::NOT_FOUND, body),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

/// 404 page for a missing object inside a known route.
pub fn not_found_page() -> Response {
    render_not_found(Layout::new("Page not found", None), String::new())
}

/// Fallback for paths no route matches.
pub async fn fallback(uri: Uri, maybe_user: MaybeUser) -> Response {
    tracing::debug!("No route for {}", uri.path());
    render_not_found(
        Layout::new("Page not found", maybe_user.0.as_ref()),
        uri.path().to_string(),
    )
}
