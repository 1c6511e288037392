use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::db::models::{Comment, Group, Post, User};
use crate::db::posts::{NewPost, PostFilter};
use crate::db::{comments, follows, groups, posts, users};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{validate_post, CommentForm, FormErrors, PostInput, ValidPost};
use crate::media::save_post_image;
use crate::pagination::{Page, PageQuery};
use crate::routes::home::Html;
use crate::routes::{parse_id, redirect, Layout};
use crate::state::AppState;

// --- View structs ---

/// Author header of the profile page.
pub struct Profile {
    pub username: String,
    pub full_name: String,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

/// Post form state: submitted values, choices and errors.
pub struct PostFormView {
    pub text: String,
    pub group_id: Option<i64>,
    pub groups: Vec<Group>,
    pub current_image: Option<String>,
    pub errors: FormErrors,
}

impl PostFormView {
    pub fn is_selected(&self, group_id: &i64) -> bool {
        self.group_id == Some(*group_id)
    }
}

// --- Templates ---

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupListTemplate {
    pub layout: Layout,
    pub group: Group,
    pub page: Page<Post>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub author: Profile,
    pub page: Page<Post>,
    pub following: bool,
    pub show_follow: bool,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate {
    pub layout: Layout,
    pub post: Post,
    pub author_posts_count: i64,
    pub comments: Vec<Comment>,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate {
    pub layout: Layout,
    pub form: PostFormView,
    pub is_edit: bool,
    pub action: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/posts/{post_id}/edit/", get(post_edit_page).post(post_edit))
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route("/create/", get(post_create_page).post(post_create))
}

// --- Handlers ---

async fn group_posts(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(slug): Path<String>,
    query: PageQuery,
) -> AppResult<Html<GroupListTemplate>> {
    let conn = state.db.get()?;
    let group = groups::find_by_slug(&conn, &slug).map_err(AppError::from_lookup)?;
    let page = posts::list_page(&conn, &PostFilter::Group(group.id), query.raw())?;

    Ok(Html(GroupListTemplate {
        layout: Layout::new(group.title.clone(), user.as_ref()),
        group,
        page,
    }))
}

async fn profile(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
    query: PageQuery,
) -> AppResult<Html<ProfileTemplate>> {
    let conn = state.db.get()?;
    let author: User = users::find_by_username(&conn, &username).map_err(AppError::from_lookup)?;

    let page = posts::list_page(&conn, &PostFilter::Author(author.id), query.raw())?;
    let following = match &user {
        Some(viewer) => follows::is_following(&conn, viewer.id, author.id)?,
        None => false,
    };
    let show_follow = user.as_ref().is_some_and(|viewer| viewer.id != author.id);

    let profile = Profile {
        full_name: author.display_name(),
        posts_count: page.count,
        followers_count: follows::followers_count(&conn, author.id)?,
        following_count: follows::following_count(&conn, author.id)?,
        username: author.username,
    };

    Ok(Html(ProfileTemplate {
        layout: Layout::new(format!("Profile of {}", profile.username), user.as_ref()),
        author: profile,
        page,
        following,
        show_follow,
    }))
}

async fn post_detail(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<PostDetailTemplate>> {
    let post_id = parse_id(&post_id)?;
    let conn = state.db.get()?;
    let post = posts::find_by_id(&conn, post_id).map_err(AppError::from_lookup)?;
    let author_posts_count = posts::count(&conn, &PostFilter::Author(post.author_id))?;
    let comments = comments::list_for_post(&conn, post.id)?;
    let can_edit = user.as_ref().is_some_and(|u| u.id == post.author_id);

    Ok(Html(PostDetailTemplate {
        layout: Layout::new(format!("Post {}", post.excerpt(30)), user.as_ref()),
        post,
        author_posts_count,
        comments,
        can_edit,
    }))
}

async fn post_create_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<PostFormTemplate>> {
    let groups = {
        let conn = state.db.get()?;
        groups::list_all(&conn)?
    };

    Ok(Html(PostFormTemplate {
        layout: Layout::new("New post", Some(&user)),
        form: PostFormView {
            text: String::new(),
            group_id: None,
            groups,
            current_image: None,
            errors: FormErrors::default(),
        },
        is_edit: false,
        action: "/create/".to_string(),
    }))
}

async fn post_create(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = PostInput::from_multipart(multipart).await?;
    let groups = {
        let conn = state.db.get()?;
        groups::list_all(&conn)?
    };

    let submitted_text = input.text.clone();
    let submitted_group = input.group.trim().parse::<i64>().ok();
    let valid = match validate_post(input, &groups) {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(Html(PostFormTemplate {
                layout: Layout::new("New post", Some(&user)),
                form: PostFormView {
                    text: submitted_text,
                    group_id: submitted_group,
                    groups,
                    current_image: None,
                    errors,
                },
                is_edit: false,
                action: "/create/".to_string(),
            })
            .into_response());
        }
    };

    let image = store_image(&state, &valid).await?;
    let post_id = {
        let conn = state.db.get()?;
        posts::create(
            &conn,
            &NewPost {
                text: &valid.text,
                author_id: user.id,
                group_id: valid.group_id,
                image: image.as_deref(),
            },
        )?
    };
    tracing::info!("{} published post {}", user.username, post_id);

    Ok(redirect(&format!("/profile/{}/", user.username)))
}

async fn post_edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let (post, groups) = {
        let conn = state.db.get()?;
        let post = posts::find_by_id(&conn, post_id).map_err(AppError::from_lookup)?;
        (post, groups::list_all(&conn)?)
    };

    if post.author_id != user.id {
        return Ok(redirect(&format!("/posts/{}/", post.id)));
    }

    Ok(Html(PostFormTemplate {
        layout: Layout::new("Edit post", Some(&user)),
        form: PostFormView {
            text: post.text.clone(),
            group_id: post.group_id,
            groups,
            current_image: post.image_url(),
            errors: FormErrors::default(),
        },
        is_edit: true,
        action: format!("/posts/{}/edit/", post.id),
    })
    .into_response())
}

async fn post_edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let (post, groups) = {
        let conn = state.db.get()?;
        let post = posts::find_by_id(&conn, post_id).map_err(AppError::from_lookup)?;
        (post, groups::list_all(&conn)?)
    };

    if post.author_id != user.id {
        tracing::warn!("{} tried to edit post {} of another author", user.username, post.id);
        return Ok(redirect(&format!("/posts/{}/", post.id)));
    }

    let input = PostInput::from_multipart(multipart).await?;
    let submitted_text = input.text.clone();
    let submitted_group = input.group.trim().parse::<i64>().ok();
    let valid = match validate_post(input, &groups) {
        Ok(valid) => valid,
        Err(errors) => {
            return Ok(Html(PostFormTemplate {
                layout: Layout::new("Edit post", Some(&user)),
                form: PostFormView {
                    text: submitted_text,
                    group_id: submitted_group,
                    groups,
                    current_image: post.image_url(),
                    errors,
                },
                is_edit: true,
                action: format!("/posts/{}/edit/", post.id),
            })
            .into_response());
        }
    };

    // Without a new upload the current image stays
    let image = match store_image(&state, &valid).await? {
        Some(path) => Some(path),
        None => post.image.clone(),
    };

    {
        let conn = state.db.get()?;
        posts::update(&conn, post.id, &valid.text, valid.group_id, image.as_deref())?;
    }
    tracing::info!("{} edited post {}", user.username, post.id);

    Ok(redirect(&format!("/posts/{}/", post.id)))
}

async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let post_id = parse_id(&post_id)?;
    let conn = state.db.get()?;
    let post = posts::find_by_id(&conn, post_id).map_err(AppError::from_lookup)?;

    // An invalid comment is dropped silently
    if let Some(text) = form.cleaned_text() {
        comments::create(&conn, post.id, user.id, text)?;
        tracing::info!("{} commented on post {}", user.username, post.id);
    }

    Ok(redirect(&format!("/posts/{}/", post.id)))
}

async fn store_image(state: &AppState, valid: &ValidPost) -> AppResult<Option<String>> {
    match &valid.image {
        Some((upload, format)) => {
            tracing::debug!("Saving upload {} ({:?})", upload.file_name, format);
            let path = save_post_image(&state.config.media_path(), &upload.bytes, *format).await?;
            Ok(Some(path))
        }
        None => Ok(None),
    }
}
