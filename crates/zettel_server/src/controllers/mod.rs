pub mod graph;
pub mod health;
pub mod notes;

use actix_web::error::InternalError;
use actix_web::{web, HttpResponse};
use zettel_core::{NoteId, NoteServiceError};

/// Maps a service failure to the JSON error response for it.
pub fn error_response(err: NoteServiceError) -> HttpResponse {
    match err {
        NoteServiceError::NoteNotFound(_) | NoteServiceError::TitleNotFound(_) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": err.to_string() }))
        }
        err if err.is_client_error() => {
            HttpResponse::BadRequest().json(serde_json::json!({ "error": err.to_string() }))
        }
        err => {
            log::error!(
                "event=http_request module=server status=error error_code={} error={}",
                err.code(),
                err
            );
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            }))
        }
    }
}

/// Parses a note id path segment; anything that is not a note id is a 404.
pub fn parse_note_id(raw: &str) -> Result<NoteId, HttpResponse> {
    raw.parse().map_err(|_| {
        HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("note not found: {raw}")
        }))
    })
}

/// JSON extractor settings: malformed bodies answer with a JSON 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(serde_json::json!({
            "error": err.to_string()
        }));
        InternalError::from_response(err, response).into()
    })
}
