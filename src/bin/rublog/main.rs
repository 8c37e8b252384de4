use actix_web::web::Data;
use actix_web::HttpServer;
use rublog::cache::PageCache;
use rublog::db::init_db;
use rublog::global::Settings;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    rublog::init::init();

    let settings = Settings::from_env().expect("Settings failed to load.");
    std::fs::create_dir_all(&settings.media_dir)?;

    let db = init_db(settings.database_url.to_owned())
        .await
        .expect("Database failed to initialize.");

    let bind_address = settings.bind_address.to_owned();
    let secret_key = settings.cookie_key();
    let db = Data::new(db);
    let cache = Data::new(PageCache::default());
    let settings = Data::new(settings);

    log::info!("Listening on {}", bind_address);
    HttpServer::new(move || {
        rublog::create_app(
            db.clone(),
            cache.clone(),
            settings.clone(),
            secret_key.clone(),
        )
    })
    // https://www.restapitutorial.com/lessons/httpmethods.html
    // GET    view_ (read/view/render entity)
    // POST   _submit (apply form)
    .bind(bind_address)?
    .run()
    .await
}
