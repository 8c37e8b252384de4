use crate::group::get_group_by_slug;
use crate::middleware::ClientCtx;
use crate::orm::groups;
use crate::paginator::{Page, PageQuery};
use crate::post::{get_group_page, PostForTemplate};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_group);
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupTemplate<'a> {
    pub client: ClientCtx,
    pub group: &'a groups::Model,
    pub page: &'a Page<PostForTemplate>,
}

#[get("/group/{slug}/")]
async fn view_group(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, Error> {
    let group = get_group_by_slug(&db, &path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Group not found."))?;

    let page = get_group_page(&db, &group, query.number())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(GroupTemplate {
        client,
        group: &group,
        page: &page,
    }
    .to_response())
}
