use crate::middleware::ClientCtx;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, header::HeaderValue, StatusCode};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpMessage, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    client: ClientCtx,
    status: StatusCode,
    message: String,
}

/// Error pages for the statuses handlers produce.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::BAD_REQUEST, error_document)
        .handler(StatusCode::FORBIDDEN, error_document)
        .handler(StatusCode::NOT_FOUND, error_document)
        .handler(StatusCode::PAYLOAD_TOO_LARGE, error_document)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, error_document)
}

pub fn error_document<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let status = res.status();
    // Internal details stay in the log.
    let message = match res.response().error() {
        Some(e) if !status.is_server_error() => e.to_string(),
        _ => status.canonical_reason().unwrap_or("Error").to_owned(),
    };
    let client = ClientCtx::get_client_ctx(&mut res.request().extensions_mut());

    let body = ErrorTemplate {
        client,
        status,
        message,
    }
    .render()
    .unwrap_or_else(|e| {
        log::error!("error_document: {}", e);
        status.to_string()
    });
    let mut res: ServiceResponse<EitherBody<B>> =
        res.map_body(|_, _| EitherBody::<B, BoxBody>::right(BoxBody::new(body)));

    // Headers must be manually set because Actix-Web renders no content by default.
    let headers = res.response_mut().headers_mut();
    // Web document
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    // Proxies love to cache error pages permanently. Explicitly say not to do that.
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(ErrorHandlerResponse::Response(res))
}
