use crate::comment::{create_comment, get_comments_for_post, CommentForTemplate};
use crate::form::{CommentForm, FormErrors, PostForm};
use crate::global::Settings;
use crate::group::list_groups;
use crate::media::save_image;
use crate::middleware::ClientCtx;
use crate::orm::groups;
use crate::post::{
    create_post, delete_post, get_post_for_template, update_post, NewPost, PostForTemplate,
};
use crate::user::count_posts;
use actix_multipart::Multipart;
use actix_web::{error, get, post, web, Error, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_post)
        .service(view_create_post)
        .service(create_post_submit)
        .service(view_edit_post)
        .service(edit_post_submit)
        .service(delete_post_submit)
        .service(add_comment);
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailTemplate<'a> {
    pub client: ClientCtx,
    pub post: &'a PostForTemplate,
    pub author_post_count: u64,
    pub comments: &'a [CommentForTemplate],
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormTemplate<'a> {
    pub client: ClientCtx,
    pub form: &'a PostForm,
    pub errors: &'a FormErrors,
    pub groups: &'a [groups::Model],
    pub is_edit: bool,
    pub action: String,
    /// Current image of the post being edited.
    pub image_url: Option<String>,
}

fn post_url(id: i32) -> String {
    format!("/posts/{}/", id)
}

async fn get_post_or_404(db: &DatabaseConnection, id: i32) -> Result<PostForTemplate, Error> {
    get_post_for_template(db, id)
        .await
        .map_err(|e| {
            log::error!("get_post_or_404: {}", e);
            error::ErrorInternalServerError("Could not find post.")
        })?
        .ok_or_else(|| error::ErrorNotFound("Post not found."))
}

/// Stores the uploaded image, if the form carries one.
async fn store_form_image(settings: &Settings, form: &PostForm) -> Result<Option<String>, Error> {
    match &form.image {
        Some(payload) => Ok(Some(save_image(&settings.media_dir, payload).await?)),
        None => Ok(None),
    }
}

#[get("/posts/{post_id}/")]
async fn view_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let post = get_post_or_404(&db, path.into_inner()).await?;

    let author_post_count = count_posts(&db, post.author_id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let comments = get_comments_for_post(&db, post.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostDetailTemplate {
        client,
        post: &post,
        author_post_count,
        comments: &comments,
    }
    .to_response())
}

#[get("/create/")]
async fn view_create_post(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(super::login_redirect(&req));
    }

    let groups = list_groups(&db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostFormTemplate {
        client,
        form: &PostForm::default(),
        errors: &FormErrors::default(),
        groups: &groups,
        is_edit: false,
        action: "/create/".to_owned(),
        image_url: None,
    }
    .to_response())
}

#[post("/create/")]
async fn create_post_submit(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
    multipart: Multipart,
) -> Result<HttpResponse, Error> {
    let author_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(super::login_redirect(&req)),
    };

    let form = PostForm::from_multipart(multipart).await?;
    let groups = list_groups(&db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let errors = form.validate(&groups);
    if !errors.is_empty() {
        return Ok(PostFormTemplate {
            client,
            form: &form,
            errors: &errors,
            groups: &groups,
            is_edit: false,
            action: "/create/".to_owned(),
            image_url: None,
        }
        .to_response());
    }

    let image = store_form_image(&settings, &form).await?;
    create_post(
        &db,
        NewPost {
            author_id,
            text: form.text.trim().to_owned(),
            group_id: form.group_id(),
            image,
        },
    )
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(super::redirect(&format!("/profile/{}/", client.get_name())))
}

#[get("/posts/{post_id}/edit/")]
async fn view_edit_post(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(super::login_redirect(&req));
    }

    let post = get_post_or_404(&db, path.into_inner()).await?;
    if !client.can_update_post(&post) {
        return Ok(super::redirect(&post_url(post.id)));
    }

    let groups = list_groups(&db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PostFormTemplate {
        client,
        form: &PostForm::from_post(&post.text, post.group_id),
        errors: &FormErrors::default(),
        groups: &groups,
        is_edit: true,
        action: format!("/posts/{}/edit/", post.id),
        image_url: post.image_url(),
    }
    .to_response())
}

#[post("/posts/{post_id}/edit/")]
async fn edit_post_submit(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    settings: web::Data<Settings>,
    path: web::Path<i32>,
    multipart: Multipart,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(super::login_redirect(&req));
    }

    let post = get_post_or_404(&db, path.into_inner()).await?;
    if !client.can_update_post(&post) {
        return Ok(super::redirect(&post_url(post.id)));
    }

    let form = PostForm::from_multipart(multipart).await?;
    let groups = list_groups(&db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let errors = form.validate(&groups);
    if !errors.is_empty() {
        return Ok(PostFormTemplate {
            client,
            form: &form,
            errors: &errors,
            groups: &groups,
            is_edit: true,
            action: format!("/posts/{}/edit/", post.id),
            image_url: post.image_url(),
        }
        .to_response());
    }

    let image = store_form_image(&settings, &form).await?;
    update_post(&db, post.id, form.text.trim(), form.group_id(), image)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(super::redirect(&post_url(post.id)))
}

#[post("/posts/{post_id}/delete/")]
async fn delete_post_submit(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(super::login_redirect(&req));
    }

    let post = get_post_or_404(&db, path.into_inner()).await?;
    if !client.can_delete_post(&post) {
        return Ok(super::redirect(&post_url(post.id)));
    }

    delete_post(&db, post.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(super::redirect(&format!("/profile/{}/", post.username)))
}

#[post("/posts/{post_id}/comment/")]
async fn add_comment(
    client: ClientCtx,
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: Option<web::Form<CommentForm>>,
) -> Result<HttpResponse, Error> {
    // Guests are redirected whatever the body holds.
    let author_id = match client.get_id() {
        Some(id) => id,
        None => return Ok(super::login_redirect(&req)),
    };

    let post = get_post_or_404(&db, path.into_inner()).await?;
    let form = form.ok_or_else(|| error::ErrorBadRequest("Comment form could not be read."))?;
    if form.validate().is_empty() {
        create_comment(&db, post.id, author_id, form.text.trim())
            .await
            .map_err(error::ErrorInternalServerError)?;
    }

    Ok(super::redirect(&post_url(post.id)))
}
