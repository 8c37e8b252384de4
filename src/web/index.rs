use crate::cache::PageCache;
use crate::middleware::ClientCtx;
use crate::paginator::{Page, PageQuery};
use crate::post::{get_index_page, PostForTemplate};
use actix_web::{error, get, web, Error, HttpResponse};
use askama_actix::Template;
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexTemplate<'a> {
    pub client: ClientCtx,
    pub page: &'a Page<PostForTemplate>,
}

/// Latest posts from everyone. Rendered pages are cached briefly per viewer.
#[get("/")]
async fn view_index(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<PageCache>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let requested = query.number();
    if let Some(body) = cache.get(&(requested, client.get_id())) {
        return Ok(super::html(body));
    }

    let page = get_index_page(&db, requested)
        .await
        .map_err(error::ErrorInternalServerError)?;
    // Stored under the page actually rendered, so out-of-range numbers share one entry.
    let key = (page.number(), client.get_id());
    let body = IndexTemplate {
        client,
        page: &page,
    }
    .render()
    .map_err(error::ErrorInternalServerError)?;

    cache.insert(key, body.to_owned());
    Ok(super::html(body))
}
