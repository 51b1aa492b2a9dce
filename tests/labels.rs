mod common;

use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::json;
use task_manager::create_app;

use common::{bearer, read_json, seeded_state, total_count, ADMIN_EMAIL};

#[actix_rt::test]
async fn test_index_lists_default_labels() {
    let state = seeded_state().await;
    let app = test::init_service(create_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/labels")
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(total_count(&resp), 2);
    let body = read_json(resp).await;
    assert_eq!(body[0]["name"], "feature");
    assert_eq!(body[1]["name"], "bug");
}

#[actix_rt::test]
async fn test_create_update_destroy() {
    let state = seeded_state().await;
    let app = test::init_service(create_app(state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/labels")
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .set_json(json!({"name": "refactoring"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = read_json(resp).await;
    assert_eq!(created["name"], "refactoring");
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/labels/{}", id))
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .set_json(json!({"name": "cleanup"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["name"], "cleanup");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/labels/{}", id))
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(state.store.find_label(id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_name_length_is_validated() {
    let state = seeded_state().await;
    let app = test::init_service(create_app(state.clone())).await;

    for name in ["ab".to_string(), "     ".to_string(), "x".repeat(1001)] {
        let req = test::TestRequest::post()
            .uri("/api/labels")
            .insert_header(bearer(&state, ADMIN_EMAIL))
            .set_json(json!({ "name": name }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_rt::test]
async fn test_duplicate_name_conflicts() {
    let state = seeded_state().await;
    let app = test::init_service(create_app(state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/labels")
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .set_json(json!({"name": "bug"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let feature = state.store.find_label_by_name("feature").await.unwrap().unwrap();
    let req = test::TestRequest::put()
        .uri(&format!("/api/labels/{}", feature.id))
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .set_json(json!({"name": "bug"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_destroy_label_in_use_conflicts() {
    let state = seeded_state().await;
    let app = test::init_service(create_app(state.clone())).await;
    let bug = state.store.find_label_by_name("bug").await.unwrap().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .set_json(json!({"title": "Fix crash", "status": "draft", "taskLabelIds": [bug.id]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/labels/{}", bug.id))
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn test_unknown_label_is_not_found() {
    let state = seeded_state().await;
    let app = test::init_service(create_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/api/labels/404")
        .insert_header(bearer(&state, ADMIN_EMAIL))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
