mod common;

use axum::http::{header, StatusCode};
use common::{app, body_string, card_count};

#[tokio::test]
async fn public_pages_are_open_to_anonymous_visitors() {
    let app = app();
    let author = app.create_user("leo");
    let group = app.create_group("cats");
    let post = app.create_post(author, Some(group), "Hello cats");

    for uri in [
        "/".to_string(),
        "/group/cats/".to_string(),
        "/profile/leo/".to_string(),
        format!("/posts/{}/", post),
        "/about/author/".to_string(),
        "/about/tech/".to_string(),
        "/auth/signup/".to_string(),
        "/auth/login/".to_string(),
    ] {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    }
}

#[tokio::test]
async fn unknown_pages_are_404() {
    let app = app();
    app.create_user("leo");

    for uri in [
        "/unexisting_page/",
        "/group/no-such-group/",
        "/profile/nobody/",
        "/posts/999/",
        "/posts/not-a-number/",
    ] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
        let body = body_string(response).await;
        assert!(body.contains("Page not found"));
    }
}

#[tokio::test]
async fn listings_paginate_by_ten() {
    let app = app();
    let author = app.create_user("leo");
    let group = app.create_group("cats");
    for i in 0..13 {
        app.create_post(author, Some(group), &format!("Post number {}", i));
    }

    for base in ["/", "/group/cats/", "/profile/leo/"] {
        let first = body_string(app.get(base, None).await).await;
        assert_eq!(card_count(&first), 10, "first page of {}", base);

        let second = body_string(app.get(&format!("{}?page=2", base), None).await).await;
        assert_eq!(card_count(&second), 3, "second page of {}", base);
    }
}

#[tokio::test]
async fn out_of_range_page_shows_last_page() {
    let app = app();
    let author = app.create_user("leo");
    for i in 0..13 {
        app.create_post(author, None, &format!("Post number {}", i));
    }

    let body = body_string(app.get("/profile/leo/?page=99", None).await).await;
    assert_eq!(card_count(&body), 3);

    let body = body_string(app.get("/profile/leo/?page=abc", None).await).await;
    assert_eq!(card_count(&body), 10);
}

#[tokio::test]
async fn listing_shows_newest_first() {
    let app = app();
    let author = app.create_user("leo");
    app.create_post(author, None, "The older post");
    app.create_post(author, None, "The newer post");

    let body = body_string(app.get("/profile/leo/", None).await).await;
    let newer = body.find("The newer post").unwrap();
    let older = body.find("The older post").unwrap();
    assert!(newer < older);
}

#[tokio::test]
async fn group_page_only_lists_its_posts() {
    let app = app();
    let author = app.create_user("leo");
    let cats = app.create_group("cats");
    app.create_group("dogs");
    app.create_post(author, Some(cats), "Meow");

    let body = body_string(app.get("/group/dogs/", None).await).await;
    assert_eq!(card_count(&body), 0);
    assert!(!body.contains("Meow"));

    let body = body_string(app.get("/group/cats/", None).await).await;
    assert_eq!(card_count(&body), 1);
}

#[tokio::test]
async fn repeated_page_parameter_uses_last_value() {
    let app = app();
    let author = app.create_user("leo");
    for i in 0..13 {
        app.create_post(author, None, &format!("Post number {}", i));
    }

    for base in ["/", "/profile/leo/"] {
        let response = app.get(&format!("{}?page=1&page=2", base), None).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", base);
        assert_eq!(card_count(&body_string(response).await), 3, "page of {}", base);
    }
}

#[tokio::test]
async fn stray_query_strings_share_one_cache_entry() {
    let app = app();
    let author = app.create_user("leo");
    app.create_post(author, None, "Only post");

    for i in 0..200 {
        let response = app.get(&format!("/?junk={}", i), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    app.get("/?page=1", None).await;
    app.get("/?page=abc", None).await;

    assert_eq!(app.state.page_cache.lock().await.len(), 1);
}

#[tokio::test]
async fn home_page_is_cached_until_cleared() {
    let app = app();
    let author = app.create_user("leo");
    app.create_post(author, None, "First post");

    let before = body_string(app.get("/", None).await).await;
    app.create_post(author, None, "Fresh post");

    let cached = body_string(app.get("/", None).await).await;
    assert_eq!(before, cached);

    app.state.clear_cache().await;
    let after = body_string(app.get("/", None).await).await;
    assert_ne!(before, after);
    assert!(after.contains("Fresh post"));
}

#[tokio::test]
async fn cached_page_is_not_shared_between_viewers() {
    let app = app();
    let leo = app.create_user("leo");
    let cookie = app.login(leo);

    let anonymous = body_string(app.get("/", None).await).await;
    let logged_in = body_string(app.get("/", Some(&cookie)).await).await;
    assert!(!anonymous.contains("/auth/logout/"));
    assert!(logged_in.contains("/auth/logout/"));
}

#[tokio::test]
async fn stylesheet_is_served() {
    let app = app();
    let response = app.get("/assets/css/style.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
}

#[tokio::test]
async fn post_text_keeps_line_breaks() {
    let app = app();
    let author = app.create_user("leo");
    let post = app.create_post(author, None, "line one\nline two");

    let body = body_string(app.get(&format!("/posts/{}/", post), None).await).await;
    assert!(body.contains("<p class=\"post-text\">line one\nline two</p>"));

    let css = body_string(app.get("/assets/css/style.css", None).await).await;
    assert!(css.contains(".post-text, .comment-text { white-space: pre-wrap; }"));
}
