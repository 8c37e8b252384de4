use crate::follow::{count_followers, follow_author, is_following, unfollow_author, FollowOutcome};
use crate::middleware::ClientCtx;
use crate::paginator::{Page, PageQuery};
use crate::post::{get_author_page, PostForTemplate};
use crate::user::{get_profile_by_name, UserProfile};
use actix_web::{error, get, route, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_profile)
        .service(profile_follow)
        .service(profile_unfollow);
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfileTemplate<'a> {
    pub client: ClientCtx,
    pub author: &'a UserProfile,
    pub page: &'a Page<PostForTemplate>,
    pub followers: u64,
    pub following: bool,
}

async fn get_author_or_404(db: &DatabaseConnection, username: &str) -> Result<UserProfile, Error> {
    get_profile_by_name(db, username)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("User not found."))
}

fn profile_url(author: &UserProfile) -> String {
    format!("/profile/{}/", author.username)
}

#[get("/profile/{username}/")]
async fn view_profile(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let author = get_author_or_404(&db, &path.into_inner()).await?;

    let page = get_author_page(&db, author.id, &author.username, query.number())
        .await
        .map_err(error::ErrorInternalServerError)?;

    let followers = count_followers(&db, author.id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let following = match client.get_id() {
        Some(user_id) => is_following(&db, user_id, author.id)
            .await
            .map_err(error::ErrorInternalServerError)?,
        None => false,
    };

    Ok(ProfileTemplate {
        client,
        author: &author,
        page: &page,
        followers,
        following,
    }
    .to_response())
}

#[route("/profile/{username}/follow/", method = "GET", method = "POST")]
async fn profile_follow(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(super::login_redirect(&req)),
    };
    let author = get_author_or_404(&db, &path.into_inner()).await?;

    match follow_author(&db, user_id, author.id)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        FollowOutcome::Created => log::debug!("profile_follow: #{} -> #{}", user_id, author.id),
        FollowOutcome::AlreadyFollowing | FollowOutcome::SelfFollow => {}
    }

    Ok(super::redirect(&profile_url(&author)))
}

#[route("/profile/{username}/unfollow/", method = "GET", method = "POST")]
async fn profile_unfollow(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(super::login_redirect(&req)),
    };
    let author = get_author_or_404(&db, &path.into_inner()).await?;

    unfollow_author(&db, user_id, author.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(super::redirect(&profile_url(&author)))
}
