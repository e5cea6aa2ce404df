mod clients;
mod context;
mod db;
mod draft;
mod error;
mod handlers;
mod middlewares;
mod models;
mod realtime;
mod repository;
mod request;
mod response;
mod storer;
mod tokener;
mod tracking;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::{delete, get, post, put, resource, scope, Data};
use actix_web::HttpServer;
use sqlx::postgres::PgPoolOptions;

use clients::sms::SmsClient;
use clients::vision::VisionClient;
use middlewares::jwt::{JwtGuard, JWT_SECRET};
use realtime::Hub;
use repository::donation::DonationRepository;
use storer::{FileStorer, LocalStorer};
use tracking::OperationGuard;

#[derive(Debug, Clone)]
pub struct UploadPath(pub String);

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,actix_web=info");
    }
    env_logger::init();

    let database_url = dotenv::var("DATABASE_URL").expect("environment variable DATABASE_URL not been set");
    let jwt_secret = dotenv::var(JWT_SECRET).expect("environment variable JWT_SECRET not been set");
    let upload_path = dotenv::var("UPLOAD_PATH").expect("environment variable UPLOAD_PATH not been set");
    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());

    std::fs::create_dir_all(&upload_path).expect("failed to create upload directory");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    db::init_schema(&pool).await.expect("failed to initialize schema");

    let hub = Hub::new(64);
    let file_storer: Arc<dyn FileStorer> = Arc::new(LocalStorer::new(&upload_path));
    let repo = Data::new(DonationRepository::new(pool.clone(), file_storer, hub.clone()));
    let guard = Data::new(OperationGuard::new());
    let hub = Data::new(hub);
    let sms = Data::new(SmsClient::new(
        dotenv::var("SMS_API_URL").expect("environment variable SMS_API_URL not been set"),
        dotenv::var("SMS_API_KEY").expect("environment variable SMS_API_KEY not been set"),
    ));
    let vision = Data::new(VisionClient::new(
        dotenv::var("VISION_API_URL").expect("environment variable VISION_API_URL not been set"),
        dotenv::var("VISION_API_KEY").expect("environment variable VISION_API_KEY not been set"),
    ));

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["POST", "OPTIONS"])
            .allowed_header(header::CONTENT_TYPE);
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(pool.clone()))
            .app_data(repo.clone())
            .app_data(guard.clone())
            .app_data(hub.clone())
            .app_data(sms.clone())
            .app_data(vision.clone())
            .app_data(Data::new(UploadPath(upload_path.clone())))
            .service(resource("signup").route(post().to(handlers::signup)))
            .service(resource("login").route(post().to(handlers::login)))
            .service(resource("logout").route(post().to(handlers::logout)))
            .service(
                scope("functions/v1")
                    .wrap(cors)
                    .route("verify", post().to(handlers::verify::verify))
                    .route("ocr", post().to(handlers::ocr::ocr)),
            )
            .service(resource("uploads/{name}").route(get().to(handlers::upload::fetch)))
            .service(
                scope("")
                    .wrap(JwtGuard::new(jwt_secret.as_bytes().to_vec()))
                    .service(resource("session").route(get().to(handlers::session)))
                    .service(resource("events").route(get().to(realtime::events)))
                    .service(
                        scope("organizations")
                            .route("me", get().to(handlers::organization::me))
                            .route("me", put().to(handlers::organization::update)),
                    )
                    .service(
                        scope("donations")
                            .route("", post().to(handlers::donation::create))
                            .route("", get().to(handlers::donation::list))
                            .route("available", get().to(handlers::donation::available))
                            .route("{donation_id}/status", put().to(handlers::donation::update_status))
                            .route("{donation_id}/rescue", post().to(handlers::donation::rescue))
                            .route("{donation_id}", delete().to(handlers::donation::delete_donation)),
                    )
                    .service(
                        scope("requests")
                            .route("", post().to(handlers::request::create))
                            .route("", get().to(handlers::request::list))
                            .route("{request_id}/status", put().to(handlers::request::update_status))
                            .route("{request_id}", delete().to(handlers::request::delete_request)),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
