// API server implementation
// Author: Gabriel Demetrios Lafis

use std::io;
use std::net::SocketAddr;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::utils::ServerConfig;
use super::{routes, AppState};

/// API server
pub struct Server {
    config: ServerConfig,
    state: web::Data<AppState>,
}

impl Server {
    /// Create a new API server
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Server {
            config,
            state: web::Data::new(state),
        }
    }

    /// Run the API server until it is stopped
    pub async fn run(&self) -> io::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid address: {}", e)))?;

        let state = self.state.clone();
        let enable_cors = self.config.enable_cors;
        let workers = self.config.workers.unwrap_or_else(num_cpus::get);

        info!("Starting server at http://{} with {} workers", addr, workers);

        HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET"])
                    .allow_any_header()
                    .max_age(3600)
            } else {
                Cors::default()
            };

            App::new()
                .app_data(state.clone())
                .wrap(cors)
                .configure(routes::configure)
        })
        .workers(workers)
        .bind(addr)?
        .run()
        .await
    }
}
