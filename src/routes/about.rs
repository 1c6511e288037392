use askama::Template;
use axum::routing::get;
use axum::Router;

use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::routes::Layout;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "about/author.html")]
pub struct AuthorTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "about/tech.html")]
pub struct TechTemplate {
    pub layout: Layout,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
}

async fn author(MaybeUser(user): MaybeUser) -> Html<AuthorTemplate> {
    Html(AuthorTemplate {
        layout: Layout::new("About the author", user.as_ref()),
    })
}

async fn tech(MaybeUser(user): MaybeUser) -> Html<TechTemplate> {
    Html(TechTemplate {
        layout: Layout::new("Technologies", user.as_ref()),
    })
}
