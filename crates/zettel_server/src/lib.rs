//! HTTP adapter for the Zettelkasten notes graph.
//!
//! Routes live in `controllers`; all note semantics come from `zettel_core`.

use actix_web::web;

pub mod config;
pub mod controllers;
pub mod db;

pub use db::Database;

/// Shared state handed to every handler.
pub struct AppState {
    pub db: Database,
}

/// Registers every route plus the JSON extractor settings.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(controllers::json_config());
    controllers::health::config_routes(cfg);
    controllers::notes::config(cfg);
    controllers::graph::config(cfg);
}
