mod analysis;
mod config;
mod fingerprint;
mod routes;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use analysis::Analyzer;
use config::Settings;
use fingerprint::SeenFingerprints;
use routes::{configure_routes, ServiceInfo};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Configuration error: {}", e),
            ));
        }
    };

    if !settings.static_dir.is_dir() {
        log::warn!(
            "Static directory {} does not exist; only the API will be served",
            settings.static_dir.display()
        );
    }

    // Lives for the whole process; only /health reads it.
    let seen = SeenFingerprints::new();
    let analyzer = web::Data::new(Analyzer::new(seen, settings.max_upload_bytes));
    let info = web::Data::new(ServiceInfo {
        system_name: settings.system_name.clone(),
        started_at: chrono::Utc::now(),
    });

    let bind_address = settings.bind_address();
    let static_dir = settings.static_dir.clone();

    log::info!("{}", settings.system_name);
    log::info!("Serving static files from {}", static_dir.display());
    log::info!("Name test images with keywords to force a class, e.g. 'tumor_scan.jpg' or 'healthy.png'");
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(analyzer.clone())
            .app_data(info.clone())
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
