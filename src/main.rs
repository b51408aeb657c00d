mod classifier;
mod config;
mod error;
mod handlers;
mod models;
mod pipeline;
mod remedies;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::{info, Level};

use crate::classifier::OnnxClassifier;
use crate::config::Config;
use crate::error::AppError;
use crate::pipeline::DiagnosisPipeline;
use crate::remedies::RemedyTable;

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_logging();
    let config = Config::from_env();

    // The model loads exactly once, before the server binds. If this fails
    // there is nothing to serve.
    let classifier = OnnxClassifier::load(&config.model_path, &config.labels_path)?;
    let remedies = match &config.remedies_path {
        Some(path) => RemedyTable::from_json_file(path)?,
        None => RemedyTable::builtin(),
    };
    info!(
        model = %config.model_path.display(),
        classes = classifier.labels().len(),
        remedies = remedies.len(),
        "model and remedy table loaded"
    );

    let pipeline = web::Data::new(DiagnosisPipeline::new(classifier, remedies));

    info!("server running at http://{}", config.bind_addr);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(pipeline.clone())
            .service(
                web::resource("/diagnose")
                    .route(web::post().to(handlers::diagnose::<OnnxClassifier>)),
            )
            .service(web::resource("/health").route(web::get().to(handlers::health)))
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await?;

    Ok(())
}
