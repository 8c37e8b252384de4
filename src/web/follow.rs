use crate::middleware::ClientCtx;
use crate::paginator::{Page, PageQuery};
use crate::post::{get_feed_page, PostForTemplate};
use actix_web::{error, get, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_feed);
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
pub struct FeedTemplate<'a> {
    pub client: ClientCtx,
    pub page: &'a Page<PostForTemplate>,
}

/// Posts by the authors the client follows.
#[get("/follow/")]
async fn view_feed(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(super::login_redirect(&req)),
    };

    let page = get_feed_page(&db, user_id, query.number())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(FeedTemplate {
        client,
        page: &page,
    }
    .to_response())
}
