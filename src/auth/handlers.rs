use askama::Template;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::session;
use crate::db::users::{self, NewUser};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::{
    safe_next, validate_password_change, validate_signup, FormErrors, LoginForm,
    PasswordChangeForm, SignupForm, NON_FIELD,
};
use crate::routes::home::Html;
use crate::routes::{redirect, Layout};
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub layout: Layout,
    pub form: SignupForm,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "users/password_change_form.html")]
pub struct PasswordChangeTemplate {
    pub layout: Layout,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/password_change_done.html")]
pub struct PasswordChangeDoneTemplate {
    pub layout: Layout,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: String,
}

const BAD_CREDENTIALS: &str = "Please enter a correct username and password. \
     Note that both fields may be case-sensitive.";

/// Redirect that also starts a session for `user_id`.
fn login_redirect(state: &AppState, user_id: i64, to: &str) -> AppResult<Response> {
    let auth = &state.config.auth;
    let token = session::create_session(&state.db, user_id, auth.session_hours)?;
    let cookie = session::session_cookie(&auth.cookie_name, &token, auth.session_hours);
    Ok(([(header::SET_COOKIE, cookie)], redirect(to)).into_response())
}

// -- Signup --

/// GET /auth/signup/
pub async fn signup_page(MaybeUser(user): MaybeUser) -> Html<SignupTemplate> {
    Html(SignupTemplate {
        layout: Layout::new("Sign up", user.as_ref()),
        form: SignupForm::default(),
        errors: FormErrors::default(),
    })
}

/// POST /auth/signup/: create the account, log it in and go home.
pub async fn signup(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let mut errors = validate_signup(&form);
    let username = form.username.trim().to_string();

    let conn = state.db.get()?;
    if !errors.has("username") && users::username_taken(&conn, &username)? {
        errors.add("username", "A user with that username already exists.");
    }

    if !errors.is_empty() {
        return Ok(Html(SignupTemplate {
            layout: Layout::new("Sign up", user.as_ref()),
            form: SignupForm {
                password1: String::new(),
                password2: String::new(),
                ..form
            },
            errors,
        })
        .into_response());
    }

    let password_hash = hash_password(&form.password1, state.config.auth.password_cost)?;
    let user_id = users::create(
        &conn,
        &NewUser {
            username: &username,
            email: form.email.trim(),
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            password_hash: &password_hash,
            is_admin: false,
        },
    )?;
    drop(conn);
    tracing::info!("New user registered: {}", username);

    login_redirect(&state, user_id, "/")
}

// -- Login --

/// GET /auth/login/
pub async fn login_page(
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        layout: Layout::new("Log in", user.as_ref()),
        username: String::new(),
        next: query.next,
        errors: FormErrors::default(),
    })
}

/// POST /auth/login/
pub async fn login(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim();
    let found = {
        let conn = state.db.get()?;
        match users::find_by_username(&conn, username) {
            Ok(found) => Some(found),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        }
    };

    match found {
        Some(account) if verify_password(&form.password, account.password_hash.as_deref()) => {
            tracing::info!("{} logged in", account.username);
            let to = safe_next(&form.next).unwrap_or("/");
            login_redirect(&state, account.id, to)
        }
        _ => {
            tracing::debug!("Failed login for {}", username);
            let mut errors = FormErrors::default();
            errors.add(NON_FIELD, BAD_CREDENTIALS);
            Ok(Html(LoginTemplate {
                layout: Layout::new("Log in", user.as_ref()),
                username: username.to_string(),
                next: form.next,
                errors,
            })
            .into_response())
        }
    }
}

// -- Logout --

/// GET or POST /auth/logout/: drop the session and show the logged-out page.
pub async fn logout(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> AppResult<Response> {
    if let Some(user) = &user {
        session::delete_session(&state.db, &user.token)?;
        tracing::info!("{} logged out", user.username);
    }

    let cookie = session::clear_session_cookie(&state.config.auth.cookie_name);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Html(LoggedOutTemplate {
            layout: Layout::new("Logged out", None),
        }),
    )
        .into_response())
}

// -- Password change --

/// GET /auth/password_change/
pub async fn password_change_page(user: CurrentUser) -> Html<PasswordChangeTemplate> {
    Html(PasswordChangeTemplate {
        layout: Layout::new("Password change", Some(&user)),
        errors: FormErrors::default(),
    })
}

/// POST /auth/password_change/
pub async fn password_change(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<PasswordChangeForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let account = users::find_by_id(&conn, user.id).map_err(AppError::from_lookup)?;

    let mut errors = validate_password_change(&form, &account.username);
    if !errors.has("old_password")
        && !verify_password(&form.old_password, account.password_hash.as_deref())
    {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }

    if !errors.is_empty() {
        return Ok(Html(PasswordChangeTemplate {
            layout: Layout::new("Password change", Some(&user)),
            errors,
        })
        .into_response());
    }

    let password_hash = hash_password(&form.new_password1, state.config.auth.password_cost)?;
    users::set_password(&conn, account.id, &password_hash)?;
    let dropped = session::delete_other_sessions(&conn, account.id, &user.token)?;
    tracing::info!(
        "{} changed password, {} other session(s) closed",
        account.username,
        dropped
    );

    Ok(redirect("/auth/password_change/done/"))
}

/// GET /auth/password_change/done/
pub async fn password_change_done(user: CurrentUser) -> Html<PasswordChangeDoneTemplate> {
    Html(PasswordChangeDoneTemplate {
        layout: Layout::new("Password changed", Some(&user)),
    })
}
