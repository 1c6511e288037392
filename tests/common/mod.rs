//! Shared helpers: a full router over a temporary database and media dir.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube::auth::password::hash_password;
use yatube::auth::session;
use yatube::config::Config;
use yatube::db::posts::{NewPost, PostFilter};
use yatube::db::users::NewUser;
use yatube::db::{self, comments, follows, groups, posts, users};
use yatube::state::AppState;

pub const PASSWORD: &str = "correct-horse-42";
pub const BOUNDARY: &str = "yatube-test-boundary";

/// 1x1 GIF.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff, 0xff,
    0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
    pub router: Router,
}

pub fn app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.resolve_paths(dir.path());
    config.auth.password_cost = 4;

    let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let state = AppState::new(pool, config);
    let router = yatube::build_router(state.clone());
    TestApp { dir, state, router }
}

impl TestApp {
    pub fn create_user(&self, username: &str) -> i64 {
        self.create_account(username, false)
    }

    pub fn create_admin(&self, username: &str) -> i64 {
        self.create_account(username, true)
    }

    fn create_account(&self, username: &str, is_admin: bool) -> i64 {
        let hash = hash_password(PASSWORD, 4).unwrap();
        let conn = self.state.db.get().unwrap();
        users::create(
            &conn,
            &NewUser {
                username,
                email: "",
                first_name: "",
                last_name: "",
                password_hash: &hash,
                is_admin,
            },
        )
        .unwrap()
    }

    /// Cookie header value for a fresh session of `user_id`.
    pub fn login(&self, user_id: i64) -> String {
        let token = session::create_session(&self.state.db, user_id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub fn create_group(&self, slug: &str) -> i64 {
        let conn = self.state.db.get().unwrap();
        groups::create(&conn, &format!("Group {}", slug), slug, "A test group").unwrap()
    }

    pub fn create_post(&self, author_id: i64, group_id: Option<i64>, text: &str) -> i64 {
        let conn = self.state.db.get().unwrap();
        posts::create(
            &conn,
            &NewPost {
                text,
                author_id,
                group_id,
                image: None,
            },
        )
        .unwrap()
    }

    pub fn post_count(&self) -> i64 {
        let conn = self.state.db.get().unwrap();
        posts::count(&conn, &PostFilter::All).unwrap()
    }

    pub fn comment_count(&self) -> i64 {
        let conn = self.state.db.get().unwrap();
        comments::count(&conn).unwrap()
    }

    pub fn follow_count(&self) -> i64 {
        let conn = self.state.db.get().unwrap();
        follows::count(&conn).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method("POST").uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = multipart_body(fields, image);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

/// Number of post cards on a rendered listing.
pub fn card_count(body: &str) -> usize {
    body.matches("class=\"post-card\"").count()
}
