pub mod account;
pub mod error;
pub mod follow;
pub mod group;
pub mod index;
pub mod post;
pub mod profile;

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order of traffic.
    index::configure(conf);
    post::configure(conf);
    profile::configure(conf);
    group::configure(conf);
    follow::configure(conf);
    account::configure(conf);
}

/// 302 to `location`.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location))
        .finish()
}

/// Sends a guest to the login page, remembering where they were going.
pub fn login_redirect(req: &HttpRequest) -> HttpResponse {
    redirect(&login_url(req.path()))
}

/// Login page URL with `next` encoded for the query string.
pub fn login_url(next: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/auth/login/?next={}", next)
}

/// Wraps an already rendered document.
pub fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(body)
}
