use crate::configuration::{DatabaseSettings, ExportSettings, Settings};
use crate::routes::subscribe::subscribe;
use crate::routes::{export_emails, health_check, subscribe_preflight};
use crate::storage::EmailStore;
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web::Data};
use anyhow::Context;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

/// The configured export secret, wrapped for `App::app_data`.
#[derive(Clone)]
pub struct ExportApiKey(pub SecretString);

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        sqlx::migrate!("./migrations")
            .run(&connection_pool)
            .await
            .context("Failed to run database migrations")?;
        let store = EmailStore::postgres(connection_pool);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, store, configuration.export)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(configuration.acquire_timeout)
        .connect_lazy_with(configuration.with_db())
}

pub fn run(
    listener: TcpListener,
    store: EmailStore,
    export: ExportSettings,
) -> Result<Server, std::io::Error> {
    let store = Data::new(store);
    let api_key = Data::new(ExportApiKey(export.api_key));
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(store.clone())
            .app_data(api_key.clone())
            .service(health_check)
            .service(subscribe)
            .service(subscribe_preflight)
            .service(export_emails)
    })
    .listen(listener)?
    .run();
    Ok(server)
}
