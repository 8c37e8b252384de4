use crate::cache::PageCache;
use crate::global::Settings;
use crate::middleware::ClientCtx;
use actix_files::Files;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{cookie::Key, web, App, Error};
use env_logger::Env;
use sea_orm::DatabaseConnection;

/// Loads `.env` and starts the logger.
pub fn init() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Builds the application with its shared state and middleware.
pub fn create_app(
    db: web::Data<DatabaseConnection>,
    cache: web::Data<PageCache>,
    settings: web::Data<Settings>,
    secret_key: Key,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let media_dir = settings.media_dir.to_owned();
    let cookie_secure = settings.cookie_secure;

    // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
    // However, services are read top->down, higher traffic routes should be
    // placed higher
    App::new()
        .app_data(db)
        .app_data(cache)
        .app_data(settings)
        .wrap(crate::web::error::error_handlers())
        .wrap(ClientCtx::default())
        .wrap(
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key)
                .cookie_secure(cookie_secure)
                .build(),
        )
        .wrap(Logger::new("%a %{User-Agent}i %r %s %Dms"))
        .configure(crate::web::configure)
        .service(Files::new("/media", media_dir))
}
