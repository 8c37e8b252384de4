#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test::TestRequest;
use actix_web::web::Data;
use rublog::cache::PageCache;
use rublog::global::Settings;
use rublog::orm::{groups, posts, users};
use rublog::post::{create_post, NewPost};
use rublog::user::{create_user, NewUser};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PASSWORD: &str = "correct horse battery";
pub const BOUNDARY: &str = "rublogtestboundary";

/// A 2x1 GIF.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

static MEDIA_DIRS: AtomicUsize = AtomicUsize::new(0);

/// Shared state of one test application.
pub struct TestState {
    pub db: DatabaseConnection,
    pub cache: Data<PageCache>,
    pub settings: Data<Settings>,
}

impl TestState {
    pub async fn new() -> Self {
        // One connection, so every query sees the same in-memory database.
        let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt)
            .await
            .expect("in-memory database");
        rublog::db::create_tables(&db)
            .await
            .expect("create tables");

        let media_dir = std::env::temp_dir().join(format!(
            "rublog-test-{}-{}",
            std::process::id(),
            MEDIA_DIRS.fetch_add(1, Ordering::SeqCst)
        ));
        // Media is served from a directory resolved when the app is built.
        std::fs::create_dir_all(&media_dir).expect("create media dir");

        Self {
            db,
            cache: Data::new(PageCache::default()),
            settings: Data::new(Settings::ephemeral(media_dir)),
        }
    }

    pub fn media_dir(&self) -> PathBuf {
        self.settings.media_dir.to_owned()
    }
}

/// Builds the full application over the test state.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(rublog::create_app(
            actix_web::web::Data::new($state.db.clone()),
            $state.cache.clone(),
            $state.settings.clone(),
            actix_web::cookie::Key::generate(),
        ))
        .await
    };
}
pub(crate) use test_app;

pub async fn user(db: &DatabaseConnection, username: &str) -> users::Model {
    create_user(
        db,
        NewUser {
            username,
            email: None,
            first_name: "",
            last_name: "",
            password: PASSWORD,
        },
    )
    .await
    .expect("create user")
}

pub async fn group(db: &DatabaseConnection, slug: &str) -> groups::Model {
    rublog::group::create_group(db, &format!("Group {}", slug), slug, "A test group.")
        .await
        .expect("create group")
}

pub async fn post(
    db: &DatabaseConnection,
    author: &users::Model,
    text: &str,
    group: Option<&groups::Model>,
) -> posts::Model {
    create_post(
        db,
        NewPost {
            author_id: author.id,
            text: text.to_owned(),
            group_id: group.map(|g| g.id),
            image: None,
        },
    )
    .await
    .expect("create post")
}

pub fn login_request(username: &str) -> TestRequest {
    TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", username), ("password", PASSWORD)])
}

/// The session cookie set by a successful login.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .expect("login sets a session cookie")
}

pub fn location<B>(resp: &ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_string<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    let bytes = actix_web::test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Posts rendered in a listing page.
pub fn count_articles(body: &str) -> usize {
    body.matches("<article").count()
}

/// Encodes text fields and an optional `image` file as multipart/form-data.
pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
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
    if let Some((filename, content_type, data)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> TestRequest {
    TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}
