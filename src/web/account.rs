use crate::form::{safe_next, FormErrors, LoginForm, SignupForm};
use crate::middleware::ClientCtx;
use crate::session;
use crate::user::{authenticate, create_user, username_exists, NewUser, UserError};
use actix_session::Session;
use actix_web::{error, get, post, route, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_signup)
        .service(signup_submit)
        .service(view_login)
        .service(login_submit)
        .service(view_logout);
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate<'a> {
    pub client: ClientCtx,
    pub form: &'a SignupForm,
    pub errors: &'a FormErrors,
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub username: &'a str,
    pub next: Option<&'a str>,
    pub failed: bool,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutTemplate {
    pub client: ClientCtx,
}

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

#[get("/auth/signup/")]
async fn view_signup(client: ClientCtx) -> impl Responder {
    SignupTemplate {
        client,
        form: &SignupForm::default(),
        errors: &FormErrors::default(),
    }
    .to_response()
}

#[post("/auth/signup/")]
async fn signup_submit(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse, Error> {
    let mut errors = form.validate();
    let username = form.username.trim();

    if !errors.has("username")
        && username_exists(&db, username)
            .await
            .map_err(error::ErrorInternalServerError)?
    {
        errors.add("username", USERNAME_TAKEN);
    }

    if !errors.is_empty() {
        return Ok(SignupTemplate {
            client,
            form: &form,
            errors: &errors,
        }
        .to_response());
    }

    let created = create_user(
        &db,
        NewUser {
            username,
            email: form.email(),
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            password: &form.password1,
        },
    )
    .await;

    match created {
        Ok(_) => Ok(super::redirect("/")),
        // Lost a race with a concurrent sign-up for the same name.
        Err(UserError::UsernameTaken) => {
            errors.add("username", USERNAME_TAKEN);
            Ok(SignupTemplate {
                client,
                form: &form,
                errors: &errors,
            }
            .to_response())
        }
        Err(e) => {
            log::error!("signup_submit: {}", e);
            Err(error::ErrorInternalServerError("Could not create user."))
        }
    }
}

#[get("/auth/login/")]
async fn view_login(client: ClientCtx, query: web::Query<NextQuery>) -> impl Responder {
    LoginTemplate {
        client,
        username: "",
        next: safe_next(query.next.as_deref()),
        failed: false,
    }
    .to_response()
}

#[post("/auth/login/")]
async fn login_submit(
    client: ClientCtx,
    session: Session,
    db: web::Data<DatabaseConnection>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, Error> {
    let next = safe_next(form.next.as_deref());
    let user = authenticate(&db, form.username.trim(), &form.password)
        .await
        .map_err(error::ErrorInternalServerError)?;

    match user {
        Some(user) => {
            session::login(&session, &user)?;
            Ok(super::redirect(next.unwrap_or("/")))
        }
        None => {
            log::debug!("login_submit: bad credentials for {}", form.username);
            Ok(LoginTemplate {
                client,
                username: &form.username,
                next,
                failed: true,
            }
            .to_response())
        }
    }
}

#[route("/auth/logout/", method = "GET", method = "POST")]
async fn view_logout(session: Session) -> impl Responder {
    session::logout(&session);
    LoggedOutTemplate {
        client: ClientCtx::default(),
    }
    .to_response()
}
