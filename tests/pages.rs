mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use common::*;
use rublog::post::delete_post;

#[actix_rt::test]
async fn test_index_paginates() {
    let state = TestState::new().await;
    let author = user(&state.db, "leo").await;
    for i in 0..13 {
        post(&state.db, &author, &format!("Post number {}", i), None).await;
    }
    let app = test_app!(state);

    let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert_eq!(count_articles(&html), 10);
    // Newest first.
    assert!(html.contains("Post number 12"));
    assert!(!html.contains("Post number 2<"));

    let req = TestRequest::get().uri("/?page=2").to_request();
    let html = body_string(test::call_service(&app, req).await).await;
    assert_eq!(count_articles(&html), 3);

    // Past the end falls back to the last page, garbage to the first.
    let req = TestRequest::get().uri("/?page=99").to_request();
    let html = body_string(test::call_service(&app, req).await).await;
    assert_eq!(count_articles(&html), 3);

    let req = TestRequest::get().uri("/?page=abc").to_request();
    let html = body_string(test::call_service(&app, req).await).await;
    assert_eq!(count_articles(&html), 10);
}

#[actix_rt::test]
async fn test_group_paginates() {
    let state = TestState::new().await;
    let author = user(&state.db, "leo").await;
    let tolstoy = group(&state.db, "tolstoy").await;
    for i in 0..13 {
        post(&state.db, &author, &format!("Grouped {}", i), Some(&tolstoy)).await;
    }
    let app = test_app!(state);

    let req = TestRequest::get().uri("/group/tolstoy/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert_eq!(count_articles(&html), 10);
    assert!(html.contains("Group tolstoy"));

    let req = TestRequest::get().uri("/group/tolstoy/?page=2").to_request();
    let html = body_string(test::call_service(&app, req).await).await;
    assert_eq!(count_articles(&html), 3);
}

#[actix_rt::test]
async fn test_profile_paginates() {
    let state = TestState::new().await;
    let author = user(&state.db, "leo").await;
    let other = user(&state.db, "fyodor").await;
    for i in 0..13 {
        post(&state.db, &author, &format!("Authored {}", i), None).await;
    }
    post(&state.db, &other, "Someone else", None).await;
    let app = test_app!(state);

    let req = TestRequest::get().uri("/profile/leo/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert_eq!(count_articles(&html), 10);
    assert!(html.contains("Posts: 13"));
    assert!(!html.contains("Someone else"));

    let req = TestRequest::get().uri("/profile/leo/?page=2").to_request();
    let html = body_string(test::call_service(&app, req).await).await;
    assert_eq!(count_articles(&html), 3);
}

#[actix_rt::test]
async fn test_group_pages_are_isolated() {
    let state = TestState::new().await;
    let author = user(&state.db, "leo").await;
    let tolstoy = group(&state.db, "tolstoy").await;
    group(&state.db, "chekhov").await;
    post(&state.db, &author, "Only for Tolstoy", Some(&tolstoy)).await;
    let app = test_app!(state);

    let req = TestRequest::get().uri("/group/tolstoy/").to_request();
    let html = body_string(test::call_service(&app, req).await).await;
    assert!(html.contains("Only for Tolstoy"));

    let req = TestRequest::get().uri("/group/chekhov/").to_request();
    let html = body_string(test::call_service(&app, req).await).await;
    assert!(!html.contains("Only for Tolstoy"));
    assert_eq!(count_articles(&html), 0);
}

#[actix_rt::test]
async fn test_unknown_entities_are_not_found() {
    let state = TestState::new().await;
    let app = test_app!(state);

    for uri in ["/group/nowhere/", "/profile/nobody/", "/posts/abc/"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_rt::test]
async fn test_unknown_url_renders_404_page() {
    let state = TestState::new().await;
    let app = test_app!(state);

    let req = TestRequest::get().uri("/unexisting_page/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
    let html = body_string(resp).await;
    assert!(html.contains("Page not found."));
}

#[actix_rt::test]
async fn test_index_is_cached() {
    let state = TestState::new().await;
    let author = user(&state.db, "leo").await;
    let doomed = post(&state.db, &author, "Cached for a while", None).await;
    let app = test_app!(state);

    let req = TestRequest::get().uri("/").to_request();
    let first = body_string(test::call_service(&app, req).await).await;
    assert!(first.contains("Cached for a while"));

    delete_post(&state.db, doomed.id).await.unwrap();

    let req = TestRequest::get().uri("/").to_request();
    let second = body_string(test::call_service(&app, req).await).await;
    assert_eq!(first, second);

    state.cache.clear();
    let req = TestRequest::get().uri("/").to_request();
    let third = body_string(test::call_service(&app, req).await).await;
    assert!(!third.contains("Cached for a while"));
}

#[actix_rt::test]
async fn test_index_cache_stays_bounded() {
    let state = TestState::new().await;
    let author = user(&state.db, "leo").await;
    post(&state.db, &author, "The only post", None).await;
    let app = test_app!(state);

    for page in 1..=50 {
        let req = TestRequest::get()
            .uri(&format!("/?page={}", page))
            .to_request();
        let html = body_string(test::call_service(&app, req).await).await;
        assert!(html.contains("The only post"));
    }

    // Every number past the end renders page 1 and shares its entry.
    assert_eq!(state.cache.len(), 1);
}
