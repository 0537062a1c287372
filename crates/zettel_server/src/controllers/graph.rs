//! Whole-graph and tag listing endpoints.

use actix_web::{web, HttpResponse, Responder};

use super::error_response;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/graph").route(web::get().to(get_graph)))
        .service(web::resource("/tags").route(web::get().to(list_tags)));
}

/// Title -> linked titles, for every note with at least one outgoing link.
async fn get_graph(data: web::Data<AppState>) -> impl Responder {
    match data.db.with_service(|service| service.graph()) {
        Ok(graph) => HttpResponse::Ok().json(graph),
        Err(err) => error_response(err),
    }
}

async fn list_tags(data: web::Data<AppState>) -> impl Responder {
    match data.db.with_service(|service| service.list_tags()) {
        Ok(tags) => HttpResponse::Ok().json(tags),
        Err(err) => error_response(err),
    }
}
