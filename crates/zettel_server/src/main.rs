use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use zettel_server::config::Config;
use zettel_server::{configure, AppState, Database};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    zettel_core::init_logging(&config.log_level, config.log_target.clone())
        .map_err(io::Error::other)?;

    let db = Database::open(&config.database).map_err(|err| {
        log::error!(
            "event=server_start module=server status=error stage=db_open error={}",
            err
        );
        io::Error::other(err.to_string())
    })?;
    let state = web::Data::new(AppState { db });

    log::info!(
        "event=server_start module=server status=ok host={} port={} version={}",
        config.host,
        config.port,
        env!("CARGO_PKG_VERSION")
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
