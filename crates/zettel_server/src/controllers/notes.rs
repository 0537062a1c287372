//! Notes REST API.
//!
//! CRUD over notes plus explicit linking. Every handler runs exactly one
//! service call under the database lock and answers with the enriched note
//! view (links and backlinks as titles).

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Deserializer};
use zettel_core::{LinkTarget, NoteDraft, NoteFilter, NoteId, NotePatch};

use super::{error_response, parse_note_id};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/notes")
            .route(web::get().to(list_notes))
            .route(web::post().to(create_note)),
    )
    .service(
        web::resource("/notes/{id}")
            .route(web::get().to(get_note))
            .route(web::put().to(update_note))
            .route(web::patch().to(update_note))
            .route(web::delete().to(delete_note)),
    )
    .service(
        web::resource("/notes/{id}/link")
            .route(web::post().to(link_note))
            .route(web::patch().to(link_note)),
    )
    .service(web::resource("/notes/{id}/links/{target_id}").route(web::post().to(link_note_by_path)));
}

#[derive(Debug, Deserialize)]
struct UpdateNoteRequest {
    title: Option<String>,
    content: Option<String>,
    /// Absent leaves tags unchanged; `null` or `[]` clears them.
    #[serde(default, deserialize_with = "nullable")]
    tags: Option<Option<Vec<String>>>,
}

impl From<UpdateNoteRequest> for NotePatch {
    fn from(value: UpdateNoteRequest) -> Self {
        Self {
            title: value.title,
            content: value.content,
            tags: value.tags.map(Option::unwrap_or_default),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LinkRequest {
    target_id: Option<NoteId>,
    target_title: Option<String>,
}

/// Distinguishes an explicit `null` from an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// List notes, optionally filtered by `tag` (wins) or `keyword`
async fn list_notes(data: web::Data<AppState>, query: web::Query<NoteFilter>) -> impl Responder {
    let filter = query.into_inner();
    match data.db.with_service(|service| service.search_notes(&filter)) {
        Ok(notes) => HttpResponse::Ok().json(notes),
        Err(err) => error_response(err),
    }
}

async fn create_note(data: web::Data<AppState>, body: web::Json<NoteDraft>) -> impl Responder {
    let draft = body.into_inner();
    match data.db.with_service(|service| service.create_note(draft)) {
        Ok(note) => HttpResponse::Created().json(note),
        Err(err) => error_response(err),
    }
}

async fn get_note(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = match parse_note_id(&path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match data.db.with_service(|service| service.get_note(id)) {
        Ok(note) => HttpResponse::Ok().json(note),
        Err(err) => error_response(err),
    }
}

async fn update_note(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateNoteRequest>,
) -> impl Responder {
    let id = match parse_note_id(&path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let patch = NotePatch::from(body.into_inner());
    match data.db.with_service(|service| service.update_note(id, patch)) {
        Ok(note) => HttpResponse::Ok().json(note),
        Err(err) => error_response(err),
    }
}

async fn delete_note(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = match parse_note_id(&path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match data.db.with_service(|service| service.delete_note(id)) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_response(err),
    }
}

/// Link by `{target_id}` or `{target_title}`; an id wins when both are given
async fn link_note(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<LinkRequest>,
) -> impl Responder {
    let source = match parse_note_id(&path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let LinkRequest {
        target_id,
        target_title,
    } = body.into_inner();
    let target = match LinkTarget::from_parts(target_id, target_title) {
        Ok(target) => target,
        Err(err) => return error_response(err),
    };

    match data.db.with_service(|service| service.link_notes(source, target)) {
        Ok(note) => HttpResponse::Ok().json(note),
        Err(err) => error_response(err),
    }
}

async fn link_note_by_path(
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (source, target) = path.into_inner();
    let (source, target) = match (parse_note_id(&source), parse_note_id(&target)) {
        (Ok(source), Ok(target)) => (source, target),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match data
        .db
        .with_service(|service| service.link_notes(source, LinkTarget::Id(target)))
    {
        Ok(note) => HttpResponse::Ok().json(note),
        Err(err) => error_response(err),
    }
}
