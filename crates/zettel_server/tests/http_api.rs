use actix_web::http::StatusCode;
use actix_web::middleware::NormalizePath;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use zettel_server::{configure, AppState, Database};

macro_rules! test_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    db: Database::open(":memory:").unwrap(),
                }))
                .wrap(NormalizePath::trim())
                .configure(configure),
        )
        .await
    };
}

macro_rules! create_note {
    ($app:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/notes")
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

macro_rules! get_json {
    ($app:expr, $uri:expr, $status:expr) => {{
        let req = test::TestRequest::get().uri($uri).to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), $status);
        let body: Value = test::read_body_json(resp).await;
        body
    }};
}

fn id_of(note: &Value) -> String {
    note["id"].as_str().unwrap().to_string()
}

#[actix_web::test]
async fn health_reports_ok() {
    let app = test_app!();
    let body = get_json!(app, "/api/health", StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[actix_web::test]
async fn reference_written_before_target_becomes_a_link() {
    let app = test_app!();
    let alpha = create_note!(app, json!({"title": "Alpha", "content": "see [[Beta]]"}));
    assert_eq!(alpha["links"], json!([]));

    let beta = create_note!(app, json!({"title": "Beta", "content": "standalone"}));
    assert_eq!(beta["backlinks"], json!(["Alpha"]));

    let alpha = get_json!(app, &format!("/notes/{}", id_of(&alpha)), StatusCode::OK);
    assert_eq!(alpha["links"], json!(["Beta"]));

    let graph = get_json!(app, "/graph", StatusCode::OK);
    assert_eq!(graph, json!({"Alpha": ["Beta"]}));
}

#[actix_web::test]
async fn tag_filter_is_case_insensitive_and_wins_over_keyword() {
    let app = test_app!();
    create_note!(
        app,
        json!({"title": "Plan", "content": "roadmap", "tags": ["Project"]})
    );
    create_note!(app, json!({"title": "Other", "content": "roadmap too"}));

    let found = get_json!(app, "/notes/?tag=PROJECT&keyword=too", StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["title"], "Plan");
    assert_eq!(found[0]["tags"], json!(["project"]));

    let found = get_json!(app, "/notes?keyword=ROADMAP", StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 2);

    let tags = get_json!(app, "/tags", StatusCode::OK);
    assert_eq!(tags, json!(["project"]));
}

#[actix_web::test]
async fn keyword_search_ignores_non_ascii_case() {
    let app = test_app!();
    create_note!(app, json!({"title": "Über Notes", "content": "Straße und ÉCOLE"}));
    create_note!(app, json!({"title": "Plain", "content": "ascii"}));

    let found = get_json!(app, "/notes?keyword=%C3%BCber", StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["title"], "Über Notes");

    let found = get_json!(app, "/notes?keyword=%C3%A9cole", StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let app = test_app!();
    let missing = uuid::Uuid::new_v4();

    let body = get_json!(app, &format!("/notes/{missing}"), StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    let body = get_json!(app, "/notes/42", StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let req = test::TestRequest::delete()
        .uri(&format!("/notes/{missing}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn invalid_payloads_are_bad_requests() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/notes")
        .set_json(json!({"title": "   ", "content": "body"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());

    let req = test::TestRequest::post()
        .uri("/notes")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());

    create_note!(app, json!({"title": "Taken", "content": "x"}));
    let req = test::TestRequest::post()
        .uri("/notes")
        .set_json(json!({"title": "Taken", "content": "y"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn partial_update_keeps_unspecified_fields() {
    let app = test_app!();
    create_note!(app, json!({"title": "Target", "content": "t"}));
    let note = create_note!(
        app,
        json!({"title": "Draft", "content": "body", "tags": ["keep"]})
    );
    let uri = format!("/notes/{}", id_of(&note));

    let req = test::TestRequest::patch()
        .uri(&uri)
        .set_json(json!({"content": "now see [[Target]]"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Draft");
    assert_eq!(body["tags"], json!(["keep"]));
    assert_eq!(body["links"], json!(["Target"]));

    let req = test::TestRequest::put()
        .uri(&uri)
        .set_json(json!({"tags": null}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["tags"], json!([]));
    assert_eq!(body["content"], "now see [[Target]]");

    let req = test::TestRequest::put()
        .uri(&uri)
        .set_json(json!({"title": "Target"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn explicit_links_by_title_id_and_path() {
    let app = test_app!();
    let a = create_note!(app, json!({"title": "A", "content": "a"}));
    let b = create_note!(app, json!({"title": "B", "content": "b"}));
    let c = create_note!(app, json!({"title": "C", "content": "c"}));
    let link_uri = format!("/notes/{}/link", id_of(&a));

    let req = test::TestRequest::post()
        .uri(&link_uri)
        .set_json(json!({"target_title": "B"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["links"], json!(["B"]));

    let req = test::TestRequest::patch()
        .uri(&link_uri)
        .set_json(json!({"target_id": id_of(&c)}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri(&format!("/notes/{}/links/{}", id_of(&b), id_of(&c)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["links"], json!(["C"]));

    let c = get_json!(app, &format!("/notes/{}", id_of(&c)), StatusCode::OK);
    assert_eq!(c["backlinks"], json!(["A", "B"]));

    let graph = get_json!(app, "/graph", StatusCode::OK);
    assert_eq!(graph, json!({"A": ["B", "C"], "B": ["C"]}));
}

#[actix_web::test]
async fn link_errors_map_to_client_statuses() {
    let app = test_app!();
    let a = create_note!(app, json!({"title": "A", "content": "a"}));
    let link_uri = format!("/notes/{}/link", id_of(&a));

    let cases = [
        (json!({"target_id": id_of(&a)}), StatusCode::BAD_REQUEST),
        (json!({}), StatusCode::BAD_REQUEST),
        (json!({"target_title": "Nobody"}), StatusCode::NOT_FOUND),
        (
            json!({"target_id": uuid::Uuid::new_v4().to_string()}),
            StatusCode::NOT_FOUND,
        ),
    ];
    for (payload, expected) in cases {
        let req = test::TestRequest::post()
            .uri(&link_uri)
            .set_json(payload.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "payload {payload}");
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    let a = get_json!(app, &format!("/notes/{}", id_of(&a)), StatusCode::OK);
    assert_eq!(a["links"], json!([]));
}

#[actix_web::test]
async fn delete_removes_note_and_its_links() {
    let app = test_app!();
    let a = create_note!(app, json!({"title": "A", "content": "to [[B]]"}));
    let b = create_note!(app, json!({"title": "B", "content": "to [[A]]"}));
    assert_eq!(b["links"], json!(["A"]));
    assert_eq!(b["backlinks"], json!(["A"]));

    let req = test::TestRequest::delete()
        .uri(&format!("/notes/{}/", id_of(&b)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    get_json!(app, &format!("/notes/{}", id_of(&b)), StatusCode::NOT_FOUND);
    let a = get_json!(app, &format!("/notes/{}", id_of(&a)), StatusCode::OK);
    assert_eq!(a["links"], json!([]));
    assert_eq!(a["backlinks"], json!([]));

    let graph = get_json!(app, "/graph", StatusCode::OK);
    assert_eq!(graph, json!({}));
}
