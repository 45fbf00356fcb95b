use crate::{
    config::Config,
    error::Result,
    ml::SentenceEncoder,
    routes::api_routes,
    services::{Catalog, RecommendationEngine, SimilarityMatrix, TitleMatcher},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use std::net::TcpListener;
use std::sync::Arc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        // Always bind to 0.0.0.0 for Docker compatibility
        let bind_address = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}:{}", self.host, self.port);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        // Load the offline-built artifacts once; they are shared read-only
        // across all workers for the lifetime of the process.
        let catalog = Arc::new(Catalog::load(&self.config.catalog_path)?);
        let similarity = Arc::new(SimilarityMatrix::load(&self.config.similarity_matrix_path)?);

        let encoder = SentenceEncoder::new(&self.config.huggingface_api_key)?;

        // Fails fast here when the matrix does not match the catalog version.
        let engine = web::Data::new(RecommendationEngine::new(
            catalog,
            similarity,
            encoder,
            TitleMatcher::default(),
        )?);

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(engine.clone())
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
